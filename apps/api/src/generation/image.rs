//! Image Pipeline: enhance a short prompt with the LLM, then build a render URL.
//!
//! Unlike the content tasks there is no degraded path: a stage-1 failure is
//! returned to the caller as `AppError::Upstream`.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::generation::composer::ComposedPrompt;
use crate::generation::generator::{ContentGenerator, ImageSettings};
use crate::generation::request::{ImageRequest, ImageResult};

/// Inclusive bounds of the anti-cache seed.
pub const SEED_MIN: u32 = 1;
pub const SEED_MAX: u32 = 999_999;

impl ContentGenerator {
    /// `prompt` is the composed enhancement request for `request`.
    pub(crate) async fn generate_image(
        &self,
        request: &ImageRequest,
        prompt: &ComposedPrompt,
    ) -> Result<ImageResult, AppError> {
        info!("Generating image for prompt: {}", request.prompt.trim());

        // Stage 1: enhance
        let enhanced = self
            .complete(prompt, false)
            .await
            .map_err(|e| {
                warn!("Image prompt enhancement failed: {e}");
                AppError::Upstream(format!("Image generation failed: {e}"))
            })?;

        let enhanced = enhanced.trim();
        if enhanced.is_empty() {
            return Err(AppError::Upstream(
                "Image generation failed: enhanced prompt was empty".to_string(),
            ));
        }
        debug!("Enhanced prompt: {enhanced}");

        // Stage 2: render URL
        let rendered_url = build_image_url(&self.image, enhanced, random_seed());
        info!("Generated image URL: {rendered_url}");

        Ok(ImageResult {
            rendered_url,
            enhanced_prompt: enhanced.to_string(),
        })
    }
}

/// Uniform seed in `[SEED_MIN, SEED_MAX]`. Only a cache key, not a secret.
pub fn random_seed() -> u32 {
    rand::thread_rng().gen_range(SEED_MIN..=SEED_MAX)
}

/// `{origin}{percent-encoded prompt}?width=..&height=..&nologo=true&seed=..`
pub fn build_image_url(settings: &ImageSettings, enhanced_prompt: &str, seed: u32) -> String {
    format!(
        "{}{}?width={}&height={}&nologo=true&seed={}",
        settings.origin,
        urlencoding::encode(enhanced_prompt),
        settings.width,
        settings.height,
        seed
    )
}

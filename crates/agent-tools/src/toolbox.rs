//! Bundle of optional collaborators handed to the orchestrator.

use std::env;
use std::sync::Arc;

use tracing::info;

use crate::error::ToolError;
use crate::tool::{FileConverter, ImageGenerator, TextExtractor, VideoGenerator, WebSearch};
use crate::tools::{
    free_image_url, HttpFileConverter, HttpImageGenerator, HttpTextExtractor, HttpVideoGenerator,
    HttpWebSearch, DEFAULT_FREE_IMAGE_URL,
};

/// The set of collaborators available to a turn.
///
/// Every capability is optional; a missing one behaves like a failing one
/// (image falls back to the free URL, video apologizes, and so on).
#[derive(Clone)]
pub struct Toolbox {
    pub image: Option<Arc<dyn ImageGenerator>>,
    pub video: Option<Arc<dyn VideoGenerator>>,
    pub converter: Option<Arc<dyn FileConverter>>,
    pub extractor: Option<Arc<dyn TextExtractor>>,
    pub search: Option<Arc<dyn WebSearch>>,
    /// Template with a `{prompt}` placeholder for the keyless image fallback.
    pub free_image_template: String,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self {
            image: None,
            video: None,
            converter: None,
            extractor: None,
            search: None,
            free_image_template: DEFAULT_FREE_IMAGE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("image", &self.image.is_some())
            .field("video", &self.video.is_some())
            .field("converter", &self.converter.is_some())
            .field("extractor", &self.extractor.is_some())
            .field("search", &self.search.is_some())
            .field("free_image_template", &self.free_image_template)
            .finish()
    }
}

impl Toolbox {
    /// An empty toolbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every endpoint configured in the environment.
    ///
    /// Optional environment variables:
    /// - `IMAGE_API_URL` - Image generation endpoint
    /// - `VIDEO_API_URL` - Video generation endpoint
    /// - `CONVERTER_API_URL` - File conversion endpoint
    /// - `EXTRACTOR_API_URL` - Document text extraction endpoint
    /// - `SEARCH_API_URL` - Web search endpoint
    /// - `TOOLS_API_KEY` - Bearer token sent to all of the above
    /// - `FREE_IMAGE_URL` - Fallback image URL template (default: pollinations)
    pub fn from_env() -> Result<Self, ToolError> {
        let api_key = non_empty_var("TOOLS_API_KEY");
        let mut toolbox = Self::new();

        if let Some(url) = non_empty_var("IMAGE_API_URL") {
            toolbox.image = Some(Arc::new(HttpImageGenerator::new(url, api_key.clone())?));
        }
        if let Some(url) = non_empty_var("VIDEO_API_URL") {
            toolbox.video = Some(Arc::new(HttpVideoGenerator::new(url, api_key.clone())?));
        }
        if let Some(url) = non_empty_var("CONVERTER_API_URL") {
            toolbox.converter = Some(Arc::new(HttpFileConverter::new(url, api_key.clone())?));
        }
        if let Some(url) = non_empty_var("EXTRACTOR_API_URL") {
            toolbox.extractor = Some(Arc::new(HttpTextExtractor::new(url, api_key.clone())?));
        }
        if let Some(url) = non_empty_var("SEARCH_API_URL") {
            toolbox.search = Some(Arc::new(HttpWebSearch::new(url, api_key.clone())?));
        }
        if let Some(template) = non_empty_var("FREE_IMAGE_URL") {
            toolbox.free_image_template = template;
        }

        info!("Toolbox configured: {:?}", toolbox);
        Ok(toolbox)
    }

    /// Set the image generator.
    pub fn with_image(mut self, image: Arc<dyn ImageGenerator>) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the video generator.
    pub fn with_video(mut self, video: Arc<dyn VideoGenerator>) -> Self {
        self.video = Some(video);
        self
    }

    /// Set the file converter.
    pub fn with_converter(mut self, converter: Arc<dyn FileConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the web search adapter.
    pub fn with_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Set the free image URL template.
    pub fn with_free_image_template(mut self, template: impl Into<String>) -> Self {
        self.free_image_template = template.into();
        self
    }

    /// Free image URL for a prompt using the configured template.
    pub fn free_image_url(&self, prompt: &str) -> String {
        free_image_url(&self.free_image_template, prompt)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toolbox_is_empty() {
        let toolbox = Toolbox::new();
        assert!(toolbox.image.is_none());
        assert!(toolbox.search.is_none());
        assert!(toolbox
            .free_image_url("cat")
            .starts_with("https://image.pollinations.ai/prompt/"));
    }

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        let vars = [
            "IMAGE_API_URL",
            "VIDEO_API_URL",
            "CONVERTER_API_URL",
            "EXTRACTOR_API_URL",
            "SEARCH_API_URL",
            "TOOLS_API_KEY",
            "FREE_IMAGE_URL",
        ];
        for var in vars {
            std::env::remove_var(var);
        }

        let toolbox = Toolbox::from_env().unwrap();
        assert!(toolbox.converter.is_none());

        std::env::set_var("CONVERTER_API_URL", "http://127.0.0.1:7000/convert");
        std::env::set_var("SEARCH_API_URL", "http://127.0.0.1:7000/search");
        std::env::set_var("FREE_IMAGE_URL", "https://img.example/{prompt}.png");
        let toolbox = Toolbox::from_env().unwrap();
        assert!(toolbox.converter.is_some());
        assert!(toolbox.search.is_some());
        assert!(toolbox.image.is_none());
        assert_eq!(toolbox.free_image_url("a cat"), "https://img.example/a%20cat.png");

        for var in vars {
            std::env::remove_var(var);
        }
    }
}

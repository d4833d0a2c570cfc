use std::env;
use std::time::Duration;

use crate::logger::{LogLevel, LoggerConfig};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_FAL_API_BASE: &str = "https://fal.run";
pub const DEFAULT_FAL_MESH_APP: &str = "fal-ai/hunyuan3d/v2/multi-view";
pub const DEFAULT_MESH_API_BASE: &str = "https://api.mesh-provider.example/v1";

#[derive(Debug, Clone)]
pub struct ImageModelConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SubscribeConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub app: String,
    pub textured_mesh: bool,
    pub enable_pbr: bool,
}

#[derive(Debug, Clone)]
pub struct TaskApiConfig {
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub api_base: String,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub image: ImageModelConfig,
    pub subscribe: SubscribeConfig,
    pub tasks: TaskApiConfig,
    pub logger: LoggerConfig,
}

impl Default for ImageModelConfig {
    fn default() -> Self {
        ImageModelConfig {
            api_key: None,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl ImageModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        ImageModelConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            api_base: non_empty_var("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            model: non_empty_var("IMAGE_MODEL").unwrap_or(defaults.model),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        SubscribeConfig {
            api_key: None,
            api_base: DEFAULT_FAL_API_BASE.to_string(),
            app: DEFAULT_FAL_MESH_APP.to_string(),
            textured_mesh: true,
            enable_pbr: true,
        }
    }
}

impl SubscribeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        SubscribeConfig {
            api_key: non_empty_var("FAL_KEY"),
            api_base: non_empty_var("FAL_API_BASE").unwrap_or(defaults.api_base),
            app: non_empty_var("FAL_MESH_APP").unwrap_or(defaults.app),
            textured_mesh: flag_var("FAL_TEXTURED_MESH").unwrap_or(defaults.textured_mesh),
            enable_pbr: flag_var("FAL_ENABLE_PBR").unwrap_or(defaults.enable_pbr),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for TaskApiConfig {
    fn default() -> Self {
        TaskApiConfig {
            api_key: None,
            client_id: None,
            api_base: DEFAULT_MESH_API_BASE.to_string(),
            poll_interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

impl TaskApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        TaskApiConfig {
            api_key: non_empty_var("MESH_API_KEY"),
            client_id: non_empty_var("MESH_CLIENT_ID"),
            api_base: non_empty_var("MESH_API_BASE").unwrap_or(defaults.api_base),
            poll_interval: non_empty_var("MESH_POLL_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            max_attempts: non_empty_var("MESH_POLL_MAX_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.max_attempts),
        }
    }

    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_attempts = max_attempts;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            image: ImageModelConfig::default(),
            subscribe: SubscribeConfig::default(),
            tasks: TaskApiConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = non_empty_var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);

        let mut logger = LoggerConfig::default();
        if let Some(level) = non_empty_var("LOG_LEVEL").and_then(|s| LogLevel::parse(&s)) {
            logger = logger.with_level(level);
        }
        if let Some(json) = flag_var("LOG_JSON") {
            logger = logger.with_json_output(json).with_colors(!json);
        }
        if let Some(path) = non_empty_var("LOG_FILE") {
            logger = logger.with_file_output(&path);
        }

        AppConfig {
            host,
            port,
            image: ImageModelConfig::from_env(),
            subscribe: SubscribeConfig::from_env(),
            tasks: TaskApiConfig::from_env(),
            logger,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_image(mut self, config: ImageModelConfig) -> Self {
        self.image = config;
        self
    }

    pub fn with_subscribe(mut self, config: SubscribeConfig) -> Self {
        self.subscribe = config;
        self
    }

    pub fn with_tasks(mut self, config: TaskApiConfig) -> Self {
        self.tasks = config;
        self
    }

    /// Credential names the synchronous endpoint still lacks.
    pub fn missing_sync_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.image.api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        if self.subscribe.api_key.is_none() {
            missing.push("FAL_KEY");
        }
        missing
    }

    /// Credential names the polling endpoint still lacks.
    pub fn missing_poll_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.image.api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        if self.tasks.api_key.is_none() {
            missing.push("MESH_API_KEY");
        }
        if self.tasks.client_id.is_none() {
            missing.push("MESH_CLIENT_ID");
        }
        missing
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag_var(name: &str) -> Option<bool> {
    non_empty_var(name).map(|val| val == "true" || val == "1")
}

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Number of concurrent execution loops draining the task backlog of one request.
    pub workers: usize,
    pub operation_cache: OperationCacheConfig,
    pub pool: PoolConfig,
    /// Whether selections injected by optimizers are scheduled.
    pub allow_internal_selections: bool,
    /// Cancels the request once elapsed, returning whatever was resolved so far.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            operation_cache: OperationCacheConfig::default(),
            pool: PoolConfig::default(),
            allow_internal_selections: false,
            timeout: None,
        }
    }
}

impl ExecutionConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationCacheConfig {
    /// If compiled operations should be cached.
    pub enabled: bool,
    /// The maximum number of operations that can be kept in the cache.
    /// 1000 by default.
    pub limit: usize,
}

impl Default for OperationCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Result nodes per pooled buffer chunk.
    pub result_buffer_size: usize,
    pub max_idle_buffers: usize,
    pub max_idle_tasks: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            result_buffer_size: 256,
            max_idle_buffers: 64,
            max_idle_tasks: 1024,
        }
    }
}

use askpdf_core::error::AppError;

/// Shared handle for the model server both providers talk to. The base URL
/// must be a plain http(s) origin; path segments belong to the individual
/// endpoint calls.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let rest = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .ok_or_else(|| {
                AppError::new(
                    "CONFIG_INVALID",
                    "Model server base URL must use http or https",
                )
                .with_details(format!("base_url={base_url}"))
            })?;
        if rest.is_empty() || rest.contains('/') || rest.contains('@') {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Model server base URL must be a bare host origin",
            )
            .with_details(format!("base_url={base_url}")));
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(std::time::Duration::from_millis(800))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("PROVIDER_UNHEALTHY", "Model server health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "PROVIDER_UNREACHABLE",
                "Failed to reach the model server",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

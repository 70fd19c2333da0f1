use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::form::POSTAL_CODE_DIGITS;
use crate::domain::entities::record::{only_digits, Address};
use crate::usecase::ports::lookup::{AddressLookup, LookupError};

pub const DEFAULT_URL_TEMPLATE: &str = "https://viacep.com.br/ws/{cep}/json/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    #[serde(default)]
    erro: Option<Value>,
}

impl ViaCepResponse {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

pub fn parse_response(body: &str) -> Result<Address, LookupError> {
    let response: ViaCepResponse = serde_json::from_str(body)
        .map_err(|err| LookupError::LookupFailed(format!("resposta inválida do ViaCEP: {err}")))?;
    if response.is_not_found() {
        return Err(LookupError::NotFound);
    }

    Ok(Address {
        street: response.logradouro.unwrap_or_default(),
        neighborhood: response.bairro.unwrap_or_default(),
        city: response.localidade.unwrap_or_default(),
        region: response.uf.unwrap_or_default(),
    })
}

pub struct ViaCepClient {
    http: reqwest::Client,
    url_template: String,
}

impl ViaCepClient {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, postal_code: &str) -> String {
        self.url_template.replace("{cep}", postal_code)
    }

    async fn fetch_body(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup(&self, postal_code: &str) -> Result<Address, LookupError> {
        let postal_code = only_digits(postal_code);
        if postal_code.len() != POSTAL_CODE_DIGITS {
            return Err(LookupError::InvalidInput);
        }

        let url = self.url_for(&postal_code);
        tracing::debug!(%url, "looking up postal code");

        let result = match self.fetch_body(&url).await {
            Ok(body) => parse_response(&body),
            Err(err) => Err(LookupError::LookupFailed(err.to_string())),
        };
        if let Err(err) = &result {
            tracing::warn!(postal_code = %postal_code, error = %err, "postal code lookup failed");
        }
        result
    }
}

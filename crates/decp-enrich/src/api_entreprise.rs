//! API Entreprise client.

use std::time::Duration;

use decp_config::EnrichmentConfig;
use serde::Deserialize;

use crate::error::EnrichError;
use crate::http::check_response;
use crate::{CompanyRecord, OrganizationDirectory};

#[derive(Deserialize)]
struct EnrichedResponse {
    data: Option<Establishment>,
}

#[derive(Deserialize)]
struct Establishment {
    unite_legale: Option<LegalUnit>,
    coordonnees: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct LegalUnit {
    personne_morale_attributs: Option<LegalEntityAttributes>,
    categorie_entreprise: Option<String>,
}

#[derive(Deserialize)]
struct LegalEntityAttributes {
    raison_sociale: Option<String>,
}

impl EnrichedResponse {
    /// `None` unless the establishment comes with its legal unit.
    fn into_record(self) -> Option<CompanyRecord> {
        let data = self.data?;
        let unit = data.unite_legale?;
        let (longitude, latitude) = match data.coordonnees.as_deref() {
            Some([lon, lat, ..]) => (Some(*lon), Some(*lat)),
            _ => (None, None),
        };
        Some(CompanyRecord {
            name: unit.personne_morale_attributs.and_then(|a| a.raison_sociale),
            size_category: unit.categorie_entreprise,
            longitude,
            latitude,
        })
    }
}

/// Company-registry client speaking the API Entreprise "enriched
/// establishment" endpoint.
pub struct ApiEntrepriseClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiEntrepriseClient {
    /// Build a client from the `enrichment` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::NotConfigured`] without a base URL and token, or
    /// [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, EnrichError> {
        if !config.is_configured() {
            return Err(EnrichError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("decp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn establishment_url(&self, siret: &str) -> String {
        format!(
            "{}/enrichi/{}?coordinates_format=WSG84",
            self.base_url,
            urlencoding::encode(siret)
        )
    }
}

impl OrganizationDirectory for ApiEntrepriseClient {
    async fn lookup(&self, siret: &str) -> Result<Option<CompanyRecord>, EnrichError> {
        let resp = self
            .http
            .get(self.establishment_url(siret))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if resp.status() == 404 {
            return Ok(None);
        }
        let body = check_response(resp).await?.text().await?;
        parse_establishment(&body)
    }
}

fn parse_establishment(body: &str) -> Result<Option<CompanyRecord>, EnrichError> {
    let response: EnrichedResponse =
        serde_json::from_str(body).map_err(|e| EnrichError::Parse(e.to_string()))?;
    Ok(response.into_record())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"{
        "data": {
            "siret": "21750001600019",
            "unite_legale": {
                "siren": "217500016",
                "categorie_entreprise": "GE",
                "personne_morale_attributs": {
                    "raison_sociale": "VILLE DE PARIS",
                    "sigle": null
                }
            },
            "coordonnees": [2.352222, 48.856613]
        },
        "links": {},
        "meta": {}
    }"#;

    fn configured() -> EnrichmentConfig {
        EnrichmentConfig {
            base_url: "https://entreprise.api.gouv.fr/v3/insee/sirene/etablissements/".into(),
            token: "secret".into(),
            ..EnrichmentConfig::default()
        }
    }

    #[test]
    fn parses_enriched_establishment() {
        let record = parse_establishment(FIXTURE).unwrap().unwrap();
        assert_eq!(
            record,
            CompanyRecord {
                name: Some("VILLE DE PARIS".into()),
                size_category: Some("GE".into()),
                longitude: Some(2.352_222),
                latitude: Some(48.856_613),
            }
        );
    }

    #[test]
    fn missing_legal_unit_is_no_entry() {
        let body = r#"{ "data": { "siret": "21750001600019", "coordonnees": [2.0, 48.0] } }"#;
        assert_eq!(parse_establishment(body).unwrap(), None);
        assert_eq!(parse_establishment(r#"{ "data": null }"#).unwrap(), None);
    }

    #[test]
    fn partial_legal_unit() {
        let body = r#"{ "data": { "unite_legale": {}, "coordonnees": null } }"#;
        assert_eq!(
            parse_establishment(body).unwrap(),
            Some(CompanyRecord::default())
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_establishment("<html>"),
            Err(EnrichError::Parse(_))
        ));
    }

    #[test]
    fn url_has_coordinates_format() {
        let client = ApiEntrepriseClient::from_config(&configured()).unwrap();
        assert_eq!(
            client.establishment_url("21750001600019"),
            "https://entreprise.api.gouv.fr/v3/insee/sirene/etablissements/enrichi/21750001600019?coordinates_format=WSG84"
        );
    }

    #[test]
    fn unconfigured_client_is_refused() {
        assert!(matches!(
            ApiEntrepriseClient::from_config(&EnrichmentConfig::default()),
            Err(EnrichError::NotConfigured)
        ));
    }
}

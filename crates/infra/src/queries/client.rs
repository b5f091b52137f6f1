//! Record service query client
//!
//! Executes `CRUDServiceProvider.loadRecords` calls and implements the
//! [`RecordLookup`] port. Lookups never return `Err`: transport faults,
//! session problems, service rejections, and invalid inputs are all captured
//! as a prefixed message in [`QueryResult::error`], so one bad row never
//! stops an enrichment run.
//!
//! The error prefixes (`Erro em Prospect:` etc.) are kept verbatim for
//! output compatibility with the original spreadsheet flow.

use std::collections::HashMap;

use async_trait::async_trait;
use prospector_core::RecordLookup;
use prospector_domain::{ApiConfig, QueryResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::http::HttpClient;
use crate::queries::fieldset::Fieldset;
use crate::queries::filter;

const LOAD_RECORDS_SERVICE: &str = "CRUDServiceProvider.loadRecords";

const PROSPECT_FIELDS: Fieldset =
    Fieldset::new(&["CODPAP", "NOMEPAP", "CGC_CPF", "TIPPESSOA", "CODVEND", "ESTADOCIVIL"]);
const NEGOTIATION_FIELDS: Fieldset =
    Fieldset::new(&["CODPAP", "CODVEND", "CODCONTATOPAP", "SITUACAO", "CODMETOD", "NUMOS"]);
const INSTALLATION_FIELDS: Fieldset =
    Fieldset::new(&["CODPAP", "NROUNICO", "ATIVO", "NROINSTALACAO", "CODDISTRIBUIDORA"]);

const PROSPECT_PREFIX: &str = "Erro em Prospect";
const NEGOTIATION_PREFIX: &str = "Erro em numero_negociacao";
const INSTALLATION_PREFIX: &str = "Erro em numero_instalacao";

// ---- request envelope ----

#[derive(Debug, Serialize)]
struct LoadRecordsRequest {
    #[serde(rename = "serviceName")]
    service_name: &'static str,
    #[serde(rename = "requestBody")]
    request_body: LoadRecordsBody,
}

#[derive(Debug, Serialize)]
struct LoadRecordsBody {
    #[serde(rename = "dataSet")]
    data_set: DataSet,
}

#[derive(Debug, Serialize)]
struct DataSet {
    #[serde(rename = "rootEntity")]
    root_entity: &'static str,
    #[serde(rename = "includePresentationFields")]
    include_presentation_fields: &'static str,
    #[serde(rename = "offsetPage")]
    offset_page: &'static str,
    criteria: Criteria,
    entity: EntitySpec,
}

#[derive(Debug, Serialize)]
struct Criteria {
    expression: Expression,
}

/// The service wraps every scalar as `{"$": value}`.
#[derive(Debug, Serialize)]
struct Expression {
    #[serde(rename = "$")]
    value: String,
}

#[derive(Debug, Serialize)]
struct EntitySpec {
    fieldset: FieldsetSpec,
}

#[derive(Debug, Serialize)]
struct FieldsetSpec {
    list: String,
}

impl LoadRecordsRequest {
    fn new(root_entity: &'static str, expression: String, fieldset: &Fieldset) -> Self {
        Self {
            service_name: LOAD_RECORDS_SERVICE,
            request_body: LoadRecordsBody {
                data_set: DataSet {
                    root_entity,
                    include_presentation_fields: "N",
                    offset_page: "0",
                    criteria: Criteria { expression: Expression { value: expression } },
                    entity: EntitySpec { fieldset: FieldsetSpec { list: fieldset.list() } },
                },
            },
        }
    }
}

// ---- response envelope ----

#[derive(Debug, Deserialize)]
struct LoadRecordsResponse {
    #[serde(rename = "responseBody")]
    response_body: Option<ResponseBody>,
    #[serde(rename = "statusMessage")]
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    entities: Option<Entities>,
}

#[derive(Debug, Deserialize)]
struct Entities {
    entity: Option<EntityList>,
}

/// One match comes back as a bare object, several as an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityList {
    Many(Vec<Entity>),
    One(Entity),
}

impl EntityList {
    fn into_vec(self) -> Vec<Entity> {
        match self {
            EntityList::Many(entities) => entities,
            EntityList::One(entity) => vec![entity],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(flatten)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    #[serde(rename = "$", default)]
    value: String,
}

impl Entity {
    /// Value of a named field, resolved through the query's fieldset.
    fn field(&self, fieldset: &Fieldset, name: &str) -> Option<&str> {
        let key = fieldset.key(name)?;
        self.fields.get(&key).map(|f| f.value.as_str())
    }
}

/// Outcome of one `loadrecords` call before field extraction
enum LoadOutcome {
    /// Entities from the response, possibly empty
    Records(Vec<Entity>),
    /// Service answered without records; carries `statusMessage` if present
    Rejected(Option<String>),
    /// Session or transport problem, already described
    Failed(String),
}

/// Query client for the record service
///
/// Reads the current session from the shared store on every call, so a
/// background refresh is picked up between rows without coordination.
pub struct RecordClient {
    http: HttpClient,
    config: ApiConfig,
    store: SessionStore,
}

impl RecordClient {
    #[must_use]
    pub fn new(http: HttpClient, config: ApiConfig, store: SessionStore) -> Self {
        Self { http, config, store }
    }

    async fn load_records(
        &self,
        root_entity: &'static str,
        expression: String,
        fieldset: &Fieldset,
    ) -> LoadOutcome {
        let Some(session) = self.store.snapshot().await else {
            return LoadOutcome::Failed("no active session".to_string());
        };

        let url = format!("{}/v1/loadrecords?outputType=json", self.config.service_base_url);
        debug!(%root_entity, expression = %expression, "loading records");

        let body = LoadRecordsRequest::new(root_entity, expression, fieldset);
        let request = self
            .http
            .request(Method::POST, &url)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("access_token", &session.access_token)
            .header("client_id", &self.config.client_id)
            .header("Cookie", format!("JSESSIONID={}", session.session_id))
            .json(&body);

        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(err) => return LoadOutcome::Failed(err.to_string()),
        };

        let status = response.status();
        let parsed: Result<LoadRecordsResponse, _> = response.json().await;
        match parsed {
            Ok(payload) => {
                let entity = payload
                    .response_body
                    .and_then(|body| body.entities)
                    .and_then(|entities| entities.entity);
                match entity {
                    Some(list) => LoadOutcome::Records(list.into_vec()),
                    // The service reports failures in statusMessage, not in
                    // the HTTP status
                    None => LoadOutcome::Rejected(payload.status_message),
                }
            }
            Err(_) if !status.is_success() => LoadOutcome::Failed(format!("HTTP {status}")),
            Err(err) => LoadOutcome::Failed(format!("invalid response body: {err}")),
        }
    }

    fn capture(prefix: &str, message: impl AsRef<str>) -> QueryResult {
        let message = message.as_ref();
        warn!(%prefix, %message, "lookup failed");
        QueryResult::err(format!("{prefix}: {message}"))
    }

    fn rejection(prefix: &str, status_message: Option<String>) -> QueryResult {
        let message =
            status_message.filter(|m| !m.is_empty()).unwrap_or_else(|| "no matching records".to_string());
        Self::capture(prefix, message)
    }
}

#[async_trait]
impl RecordLookup for RecordClient {
    /// `ParceiroProspect` by tax id; returns the CODPAP field.
    async fn find_prospect_code(&self, tax_id: &str) -> QueryResult {
        let expression = filter::string_equals("CGC_CPF", tax_id);
        match self.load_records("ParceiroProspect", expression, &PROSPECT_FIELDS).await {
            LoadOutcome::Records(entities) => match entities.first() {
                Some(entity) => match entity.field(&PROSPECT_FIELDS, "CODPAP") {
                    Some(value) => QueryResult::ok(value),
                    None => Self::capture(PROSPECT_PREFIX, "record is missing the CODPAP field"),
                },
                None => Self::rejection(PROSPECT_PREFIX, None),
            },
            LoadOutcome::Rejected(status_message) => {
                Self::rejection(PROSPECT_PREFIX, status_message)
            }
            LoadOutcome::Failed(message) => Self::capture(PROSPECT_PREFIX, message),
        }
    }

    /// `OrdemServico` by prospect code; returns NUMOS of the first record.
    async fn find_negotiation_number(&self, prospect_code: &str) -> QueryResult {
        let expression = match filter::numeric_equals("CODPAP", prospect_code) {
            Ok(expression) => expression,
            Err(message) => return Self::capture(NEGOTIATION_PREFIX, message),
        };
        match self.load_records("OrdemServico", expression, &NEGOTIATION_FIELDS).await {
            LoadOutcome::Records(entities) => match entities.first() {
                Some(entity) => match entity.field(&NEGOTIATION_FIELDS, "NUMOS") {
                    Some(value) => QueryResult::ok(value),
                    None => {
                        Self::capture(NEGOTIATION_PREFIX, "record is missing the NUMOS field")
                    }
                },
                None => Self::rejection(NEGOTIATION_PREFIX, None),
            },
            LoadOutcome::Rejected(status_message) => {
                Self::rejection(NEGOTIATION_PREFIX, status_message)
            }
            LoadOutcome::Failed(message) => Self::capture(NEGOTIATION_PREFIX, message),
        }
    }

    /// `AD_INSTPROSP` by prospect code; returns all non-empty NROINSTALACAO
    /// values joined with `;`.
    async fn find_installation_numbers(&self, prospect_code: &str) -> QueryResult {
        let expression = match filter::numeric_equals("CODPAP", prospect_code) {
            Ok(expression) => expression,
            Err(message) => return Self::capture(INSTALLATION_PREFIX, message),
        };
        match self.load_records("AD_INSTPROSP", expression, &INSTALLATION_FIELDS).await {
            LoadOutcome::Records(entities) if entities.is_empty() => {
                Self::rejection(INSTALLATION_PREFIX, None)
            }
            LoadOutcome::Records(entities) => {
                let numbers: Vec<&str> = entities
                    .iter()
                    .filter_map(|entity| entity.field(&INSTALLATION_FIELDS, "NROINSTALACAO"))
                    .filter(|value| !value.is_empty())
                    .collect();
                QueryResult::ok(numbers.join(";"))
            }
            LoadOutcome::Rejected(status_message) => {
                Self::rejection(INSTALLATION_PREFIX, status_message)
            }
            LoadOutcome::Failed(message) => Self::capture(INSTALLATION_PREFIX, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use prospector_domain::SessionSnapshot;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(server: &MockServer) -> ApiConfig {
        ApiConfig {
            auth_base_url: server.uri(),
            service_base_url: server.uri(),
            auth_header: String::new(),
            client_id: "client-123".to_string(),
            username: "SVC_USER".to_string(),
            internal_id: "42".to_string(),
            timeout_secs: 5,
        }
    }

    async fn authed_client(server: &MockServer) -> RecordClient {
        let store = SessionStore::new();
        store
            .publish(SessionSnapshot::new("tok-abc".to_string(), 3600, "sess-999".to_string()))
            .await;
        let http = HttpClient::builder().max_attempts(1).build().expect("http client");
        RecordClient::new(http, test_config(server), store)
    }

    fn entity(fields: &[(&str, &str)]) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, value) in fields {
            map.insert((*key).to_string(), json!({ "$": value }));
        }
        serde_json::Value::Object(map)
    }

    fn records_response(entity_value: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "responseBody": { "entities": { "total": "1", "entity": entity_value } },
        }))
    }

    #[tokio::test]
    async fn prospect_lookup_extracts_codpap_from_single_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .and(header("Authorization", "Bearer tok-abc"))
            .and(header("client_id", "client-123"))
            .and(header("Cookie", "JSESSIONID=sess-999"))
            .and(body_partial_json(json!({
                "serviceName": "CRUDServiceProvider.loadRecords",
                "requestBody": { "dataSet": {
                    "rootEntity": "ParceiroProspect",
                    "criteria": { "expression": { "$": "this.CGC_CPF = '12345678900'" } },
                    "entity": { "fieldset": {
                        "list": "CODPAP,NOMEPAP,CGC_CPF,TIPPESSOA,CODVEND,ESTADOCIVIL",
                    } },
                } },
            })))
            .respond_with(records_response(entity(&[("f0", "123"), ("f1", "ACME")])))
            .expect(1)
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_prospect_code("12345678900").await;

        assert_eq!(result, QueryResult::ok("123"));
    }

    #[tokio::test]
    async fn prospect_filter_doubles_embedded_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .and(body_partial_json(json!({
                "requestBody": { "dataSet": {
                    "criteria": { "expression": { "$": "this.CGC_CPF = '12''34'" } },
                } },
            })))
            .respond_with(records_response(entity(&[("f0", "7")])))
            .expect(1)
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_prospect_code("12'34").await;

        assert_eq!(result, QueryResult::ok("7"));
    }

    #[tokio::test]
    async fn negotiation_lookup_takes_first_entity_of_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .and(body_partial_json(json!({
                "requestBody": { "dataSet": {
                    "rootEntity": "OrdemServico",
                    "criteria": { "expression": { "$": "this.CODPAP = 123" } },
                } },
            })))
            .respond_with(records_response(json!([
                entity(&[("f0", "123"), ("f5", "900100")]),
                entity(&[("f0", "123"), ("f5", "900200")]),
            ])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_negotiation_number("123").await;

        assert_eq!(result, QueryResult::ok("900100"));
    }

    #[tokio::test]
    async fn negotiation_lookup_rejects_non_numeric_code_without_calling_out() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;

        let result = client.find_negotiation_number("123 OR 1=1").await;

        assert!(result.is_err());
        assert!(result.error.starts_with("Erro em numero_negociacao: "), "{}", result.error);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn installation_lookup_joins_non_empty_numbers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .and(body_partial_json(json!({
                "requestBody": { "dataSet": { "rootEntity": "AD_INSTPROSP" } },
            })))
            .respond_with(records_response(json!([
                entity(&[("f3", "INST-1")]),
                entity(&[("f3", "")]),
                entity(&[("f0", "123")]),
                entity(&[("f3", "INST-2")]),
            ])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_installation_numbers("123").await;

        assert_eq!(result, QueryResult::ok("INST-1;INST-2"));
    }

    #[tokio::test]
    async fn installation_lookup_accepts_single_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(records_response(entity(&[("f3", "INST-9")])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_installation_numbers("123").await;

        assert_eq!(result, QueryResult::ok("INST-9"));
    }

    #[tokio::test]
    async fn service_rejection_surfaces_status_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "statusMessage": "Sessão expirada",
            })))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_prospect_code("12345678900").await;

        assert_eq!(result.error, "Erro em Prospect: Sessão expirada");
        assert!(result.value.is_empty());
    }

    #[tokio::test]
    async fn missing_session_is_captured_without_http_call() {
        let server = MockServer::start().await;
        let http = HttpClient::builder().max_attempts(1).build().expect("http client");
        let client = RecordClient::new(http, test_config(&server), SessionStore::new());

        let result = client.find_prospect_code("12345678900").await;

        assert_eq!(result.error, "Erro em Prospect: no active session");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn http_failure_is_captured_with_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_installation_numbers("123").await;

        assert!(result.is_err());
        assert!(result.error.starts_with("Erro em numero_instalacao: "), "{}", result.error);
    }

    #[tokio::test]
    async fn empty_entity_array_is_reported_as_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(records_response(json!([])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_installation_numbers("123").await;

        assert_eq!(result.error, "Erro em numero_instalacao: no matching records");
        assert!(result.value.is_empty());
    }

    #[tokio::test]
    async fn entity_without_codpap_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(records_response(entity(&[("f1", "ACME")])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_prospect_code("12345678900").await;

        // A record without the extracted field must never look like success
        assert!(result.is_err(), "got value={:?} error={:?}", result.value, result.error);
        assert!(result.value.is_empty());
        assert!(result.error.starts_with("Erro em Prospect: "), "{}", result.error);
    }

    #[tokio::test]
    async fn entity_without_numos_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/loadrecords"))
            .respond_with(records_response(json!([entity(&[("f0", "123")])])))
            .mount(&server)
            .await;

        let client = authed_client(&server).await;
        let result = client.find_negotiation_number("123").await;

        assert!(result.is_err());
        assert!(result.value.is_empty());
        assert!(result.error.starts_with("Erro em numero_negociacao: "), "{}", result.error);
    }
}

//! The workflow backend as seen by the designer. The backend owns every
//! definition, state, and transition; the designer only reads them and asks
//! for mutations.

use crate::error::BackendError;
use crate::model::{
    DefinitionDetail, NewDefinition, NewState, NewTransition, ProcessDefinition, ProcessType,
    RecordId,
};

pub trait WorkflowBackend {
    fn list_definitions(
        &self,
        process_type: Option<ProcessType>,
    ) -> Result<Vec<ProcessDefinition>, BackendError>;

    fn get_definition(&self, id: &RecordId) -> Result<DefinitionDetail, BackendError>;

    fn create_definition(&self, definition: &NewDefinition) -> Result<(), BackendError>;

    fn activate_definition(&self, id: &RecordId) -> Result<(), BackendError>;

    fn add_state(&self, definition_id: &RecordId, state: &NewState) -> Result<(), BackendError>;

    fn add_transition(
        &self,
        definition_id: &RecordId,
        transition: &NewTransition,
    ) -> Result<(), BackendError>;
}

impl<T: WorkflowBackend + ?Sized> WorkflowBackend for Box<T> {
    fn list_definitions(
        &self,
        process_type: Option<ProcessType>,
    ) -> Result<Vec<ProcessDefinition>, BackendError> {
        (**self).list_definitions(process_type)
    }

    fn get_definition(&self, id: &RecordId) -> Result<DefinitionDetail, BackendError> {
        (**self).get_definition(id)
    }

    fn create_definition(&self, definition: &NewDefinition) -> Result<(), BackendError> {
        (**self).create_definition(definition)
    }

    fn activate_definition(&self, id: &RecordId) -> Result<(), BackendError> {
        (**self).activate_definition(id)
    }

    fn add_state(&self, definition_id: &RecordId, state: &NewState) -> Result<(), BackendError> {
        (**self).add_state(definition_id, state)
    }

    fn add_transition(
        &self,
        definition_id: &RecordId,
        transition: &NewTransition,
    ) -> Result<(), BackendError> {
        (**self).add_transition(definition_id, transition)
    }
}

/// Route of each backend operation relative to the API base URL.
pub mod routes {
    use crate::model::{ProcessType, RecordId};

    pub fn definitions(base: &str, process_type: Option<ProcessType>) -> String {
        let base = base.trim_end_matches('/');
        match process_type {
            Some(kind) => format!("{base}/workflow/definitions?processType={}", kind.as_str()),
            None => format!("{base}/workflow/definitions"),
        }
    }

    pub fn definition(base: &str, id: &RecordId) -> String {
        format!("{}/workflow/definitions/{}", base.trim_end_matches('/'), id)
    }

    pub fn activate(base: &str, id: &RecordId) -> String {
        format!("{}/activate", definition(base, id))
    }

    pub fn states(base: &str, id: &RecordId) -> String {
        format!("{}/states", definition(base, id))
    }

    pub fn transitions(base: &str, id: &RecordId) -> String {
        format!("{}/transitions", definition(base, id))
    }
}

#[cfg(feature = "http")]
pub use http::HttpBackend;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::blocking::{Client, Response};
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use super::{WorkflowBackend, routes};
    use crate::config::BackendConfig;
    use crate::error::BackendError;
    use crate::model::{
        DefinitionDetail, NewDefinition, NewState, NewTransition, ProcessDefinition, ProcessType,
        RecordId,
    };

    /// Blocking JSON-over-HTTP client for the workflow REST API.
    #[derive(Debug, Clone)]
    pub struct HttpBackend {
        client: Client,
        base_url: String,
    }

    impl HttpBackend {
        pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            Ok(Self {
                client,
                base_url: config.base_url.clone(),
            })
        }

        fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
            tracing::debug!(url, "GET");
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            let response = check_status(response)?;
            response
                .json::<T>()
                .map_err(|e| BackendError::Decode(e.to_string()))
        }

        fn post<B: Serialize + ?Sized>(&self, url: &str, body: Option<&B>) -> Result<(), BackendError> {
            tracing::debug!(url, "POST");
            let request = self.client.post(url);
            let request = match body {
                Some(body) => request.json(body),
                None => request,
            };
            let response = request
                .send()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            check_status(response).map(|_| ())
        }
    }

    fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }

    impl WorkflowBackend for HttpBackend {
        fn list_definitions(
            &self,
            process_type: Option<ProcessType>,
        ) -> Result<Vec<ProcessDefinition>, BackendError> {
            self.get(&routes::definitions(&self.base_url, process_type))
        }

        fn get_definition(&self, id: &RecordId) -> Result<DefinitionDetail, BackendError> {
            self.get(&routes::definition(&self.base_url, id))
        }

        fn create_definition(&self, definition: &NewDefinition) -> Result<(), BackendError> {
            self.post(&routes::definitions(&self.base_url, None), Some(definition))
        }

        fn activate_definition(&self, id: &RecordId) -> Result<(), BackendError> {
            self.post::<()>(&routes::activate(&self.base_url, id), None)
        }

        fn add_state(&self, definition_id: &RecordId, state: &NewState) -> Result<(), BackendError> {
            self.post(&routes::states(&self.base_url, definition_id), Some(state))
        }

        fn add_transition(
            &self,
            definition_id: &RecordId,
            transition: &NewTransition,
        ) -> Result<(), BackendError> {
            self.post(
                &routes::transitions(&self.base_url, definition_id),
                Some(transition),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::routes;
    use crate::model::{ProcessType, RecordId};

    #[test]
    fn routes_join_base_without_double_slash() {
        let id = RecordId::from(42u64);
        assert_eq!(
            routes::definition("http://host/api/", &id),
            "http://host/api/workflow/definitions/42"
        );
        assert_eq!(
            routes::transitions("http://host/api", &id),
            "http://host/api/workflow/definitions/42/transitions"
        );
        assert_eq!(
            routes::definitions("http://host/api", Some(ProcessType::Change)),
            "http://host/api/workflow/definitions?processType=CHANGE"
        );
    }
}

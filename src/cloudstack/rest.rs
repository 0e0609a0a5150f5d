use crate::cloudstack::client::CloudStackClient;
use crate::cloudstack::types::{Network, ServiceOffering, Template, TemplateFilter, VirtualMachine};
use crate::core::errors::{CloudError, ProtocolErrorKind};
use crate::core::kernel::envelope::Payload;
use crate::core::kernel::{Transport, QUERY_ASYNC_JOB_RESULT};
use crate::core::types::{AsyncOptions, ParameterSet};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Thin typed wrapper around `CloudStackClient`
///
/// Adds `projectid` to every call when a project is configured, and decodes
/// the resource lists the subcommands need.
pub struct CloudStackApi<T: Transport> {
    client: CloudStackClient<T>,
    project_id: Option<String>,
}

impl<T: Transport> CloudStackApi<T> {
    pub fn new(client: CloudStackClient<T>, project_id: Option<String>) -> Self {
        Self { client, project_id }
    }

    pub fn client(&self) -> &CloudStackClient<T> {
        &self.client
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Add the configured project unless the caller already set one, in
    /// any letter case.
    fn scoped(&self, mut params: ParameterSet) -> ParameterSet {
        let Some(project_id) = &self.project_id else {
            return params;
        };
        if !params
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case("projectid"))
        {
            params.insert("projectid", project_id);
        }
        params
    }

    /// Call any operation, project-scoped.
    pub async fn invoke(
        &self,
        operation: &str,
        params: ParameterSet,
        is_async: bool,
    ) -> Result<Payload, CloudError> {
        self.client
            .invoke(operation, &self.scoped(params), is_async)
            .await
    }

    /// Project-scoped [`CloudStackClient::invoke_with`].
    pub async fn invoke_with(
        &self,
        operation: &str,
        params: ParameterSet,
        is_async: bool,
        options: AsyncOptions,
        cancel: &CancellationToken,
    ) -> Result<Payload, CloudError> {
        self.client
            .invoke_with(operation, &self.scoped(params), is_async, options, cancel)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_virtual_machines(&self) -> Result<Vec<VirtualMachine>, CloudError> {
        let payload = self
            .invoke("listVirtualMachines", ParameterSet::new(), false)
            .await?;
        list_of(payload, "virtualmachine")
    }

    #[instrument(skip(self))]
    pub async fn list_networks(&self) -> Result<Vec<Network>, CloudError> {
        let payload = self
            .invoke("listNetworks", ParameterSet::new(), false)
            .await?;
        list_of(payload, "network")
    }

    #[instrument(skip(self))]
    pub async fn list_templates(&self, filter: TemplateFilter) -> Result<Vec<Template>, CloudError> {
        let params = ParameterSet::from([("templatefilter", filter.as_str())]);
        let payload = self.invoke("listTemplates", params, false).await?;
        list_of(payload, "template")
    }

    #[instrument(skip(self))]
    pub async fn list_service_offerings(&self) -> Result<Vec<ServiceOffering>, CloudError> {
        let payload = self
            .invoke("listServiceOfferings", ParameterSet::new(), false)
            .await?;
        list_of(payload, "serviceoffering")
    }

    /// Replace a machine's user data. `userdata` must already be base64.
    #[instrument(skip(self, userdata), fields(userdata_len = userdata.len()))]
    pub async fn update_virtual_machine_userdata(
        &self,
        id: &str,
        userdata: &str,
    ) -> Result<VirtualMachine, CloudError> {
        let params = ParameterSet::from([("id", id), ("userdata", userdata)]);
        let mut payload = self.invoke("updateVirtualMachine", params, false).await?;
        match payload.remove("virtualmachine") {
            Some(vm) => decode(vm, "virtualmachine"),
            None => Err(CloudError::protocol(
                ProtocolErrorKind::UnexpectedEnvelopeShape,
                "updateVirtualMachine response has no 'virtualmachine'",
            )),
        }
    }

    /// One-shot status check for a job.
    pub async fn query_async_job_result(&self, job_id: &str) -> Result<Payload, CloudError> {
        self.client
            .invoke(
                QUERY_ASYNC_JOB_RESULT,
                &ParameterSet::from([("jobid", job_id)]),
                false,
            )
            .await
    }
}

/// Decode the list under `key`; an absent key means an empty list.
pub fn list_of<D: DeserializeOwned>(mut payload: Payload, key: &str) -> Result<Vec<D>, CloudError> {
    match payload.remove(key) {
        Some(items) => decode(items, key),
        None => Ok(Vec::new()),
    }
}

fn decode<D: DeserializeOwned>(value: Value, key: &str) -> Result<D, CloudError> {
    serde_json::from_value(value).map_err(|e| {
        CloudError::protocol(
            ProtocolErrorKind::UnexpectedEnvelopeShape,
            format!("cannot decode '{}': {}", key, e),
        )
    })
}

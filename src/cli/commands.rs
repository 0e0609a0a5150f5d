//! Subcommand handlers.
//!
//! Results go to `out` in the selected format; warnings go to `warn` so that
//! stdout stays parseable.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, info};

use crate::cli::args::{CallArgs, Commands, GenerateTemplateArgs, UpdateUserdataArgs};
use crate::cli::error::CliError;
use crate::cli::output::{
    DeploymentLines, IpList, MachineNames, MachineTable, NetworkNames, NetworkTable,
    OfferingTable, OutputFormat, RawPayload, TemplateTable, UserdataReport, UserdataUpdate,
};
use crate::cloudstack::converters::{
    self, deployment_line, filter_by_name, search_machines, DeploymentSpec, MachineSummary,
    NetworkSummary, OfferingSummary, TemplateSummary,
};
use crate::cloudstack::rest::CloudStackApi;
use crate::cloudstack::types::TemplateFilter;
use crate::core::kernel::Transport;
use crate::core::types::{AsyncOptions, ParameterSet};
use tokio_util::sync::CancellationToken;

pub struct CommandRunner<'a, T: Transport> {
    api: &'a CloudStackApi<T>,
}

impl<'a, T: Transport> CommandRunner<'a, T> {
    pub const fn new(api: &'a CloudStackApi<T>) -> Self {
        Self { api }
    }

    pub async fn execute<W: Write, E: Write>(
        &self,
        out: &mut W,
        warn: &mut E,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::ListMachines => {
                let machines = self.machines(warn, None).await?;
                let names: BTreeSet<String> = machines.into_iter().map(|m| m.name).collect();
                format.write(
                    out,
                    &MachineNames {
                        names: names.into_iter().collect(),
                    },
                )
            }
            Commands::GetMachineInfo { term } => {
                let mut machines = self.machines(warn, Some(term.as_str())).await?;
                machines.sort_by(|a, b| a.zonename.cmp(&b.zonename));
                format.write(out, &MachineTable { machines })
            }
            Commands::GetMachinesIps { name, only_first } => {
                let ips = self.machine_ips(warn, name).await?;
                let ips = if *only_first {
                    ips.into_iter().take(1).collect()
                } else {
                    ips
                };
                format.write(out, &IpList { ips })
            }
            Commands::ListNetworks => {
                let mut networks = self.networks(warn, None).await?;
                networks.sort_by(|a, b| a.name.cmp(&b.name));
                format.write(out, &NetworkNames { networks })
            }
            Commands::GetNetworkInfo { name } => {
                let mut networks = self.networks(warn, Some(name.as_str())).await?;
                networks.sort_by(|a, b| a.name.cmp(&b.name));
                format.write(out, &NetworkTable { networks })
            }
            Commands::ListOsTemplates => {
                let mut templates = self.templates(warn).await?;
                templates.sort_by(|a, b| a.displaytext.cmp(&b.displaytext));
                format.write(out, &TemplateTable { templates })
            }
            Commands::ListServiceOfferings => {
                let mut offerings = self.offerings(warn, None).await?;
                offerings.sort_by(|a, b| a.name.cmp(&b.name));
                format.write(out, &OfferingTable { offerings })
            }
            Commands::GenerateTemplate(args) => {
                let lines = self.generate_template(warn, args).await?;
                format.write(out, &DeploymentLines { lines })
            }
            Commands::UpdateMachineUserdata(args) => {
                let report = self.update_userdata(warn, args).await?;
                format.write(out, &report)
            }
            Commands::Call(args) => {
                let payload = self.call(args).await?;
                format.write(out, &RawPayload { payload })
            }
        }
    }

    async fn machines<E: Write>(
        &self,
        warn: &mut E,
        term: Option<&str>,
    ) -> Result<Vec<MachineSummary>, CliError> {
        let vms = self.api.list_virtual_machines().await?;
        if vms.is_empty() {
            writeln!(warn, "Empty virtual machines list. Maybe wrong or empty projectid?")?;
        }
        let summaries = vms.iter().map(converters::convert_machine).collect();
        Ok(search_machines(summaries, term))
    }

    async fn machine_ips<E: Write>(&self, warn: &mut E, name: &str) -> Result<Vec<String>, CliError> {
        let ips: Vec<String> = self
            .machines(warn, Some(name))
            .await?
            .into_iter()
            .filter(|m| m.name == name)
            .map(|m| m.ipaddress)
            .collect();
        if ips.is_empty() {
            return Err(CliError::NotFound("Machine not found".to_string()));
        }
        Ok(ips)
    }

    async fn networks<E: Write>(
        &self,
        warn: &mut E,
        name: Option<&str>,
    ) -> Result<Vec<NetworkSummary>, CliError> {
        let networks = self.api.list_networks().await?;
        if networks.is_empty() {
            writeln!(warn, "Empty networks list. Maybe wrong or empty projectid?")?;
        }
        let summaries = networks.iter().map(converters::convert_network).collect();
        Ok(match name {
            Some(name) => filter_by_name(summaries, name),
            None => summaries,
        })
    }

    async fn templates<E: Write>(&self, warn: &mut E) -> Result<Vec<TemplateSummary>, CliError> {
        let templates = self.api.list_templates(TemplateFilter::SelfOwned).await?;
        if templates.is_empty() {
            writeln!(warn, "Empty templates list. Maybe wrong or empty projectid?")?;
        }
        Ok(templates.iter().map(converters::convert_template).collect())
    }

    async fn offerings<E: Write>(
        &self,
        warn: &mut E,
        name: Option<&str>,
    ) -> Result<Vec<OfferingSummary>, CliError> {
        let offerings = self.api.list_service_offerings().await?;
        if offerings.is_empty() {
            writeln!(warn, "Empty service offering list. Maybe wrong or empty projectid?")?;
        }
        let summaries = offerings.iter().map(converters::convert_offering).collect();
        Ok(match name {
            Some(name) => filter_by_name(summaries, name),
            None => summaries,
        })
    }

    async fn generate_template<E: Write>(
        &self,
        warn: &mut E,
        args: &GenerateTemplateArgs,
    ) -> Result<Vec<String>, CliError> {
        let networks = self.networks(warn, Some(args.network_name.as_str())).await?;
        let offering = self
            .offerings(warn, Some(args.service_offering.as_str()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CliError::NotFound(format!(
                    "Service offering {} not found",
                    args.service_offering
                ))
            })?;

        let spec = DeploymentSpec {
            project_id: self.api.project_id().unwrap_or_default(),
            display_name: &args.name,
            template_id: &args.os_template_id,
            service_offering_id: &offering.id,
            disk_offering_id: args.disk_offering_id.as_deref(),
            disk_size: args.disk_offering_size.as_deref(),
        };
        Ok(networks
            .iter()
            .map(|network| deployment_line(network, &spec))
            .collect())
    }

    async fn update_userdata<E: Write>(
        &self,
        warn: &mut E,
        args: &UpdateUserdataArgs,
    ) -> Result<UserdataReport, CliError> {
        let machines = self.machines(warn, Some(args.machine_name.as_str())).await?;
        if machines.is_empty() {
            return Err(CliError::NotFound(format!(
                "Machine {} not found",
                args.machine_name
            )));
        }
        let userdata = encode_file(&args.user_data_file).await?;

        let mut updates = Vec::new();
        for machine in machines {
            if args.machine_id.as_ref().is_some_and(|id| *id != machine.id) {
                continue;
            }
            let mut update = UserdataUpdate {
                machine_name: machine.name.clone(),
                id: machine.id.clone(),
                updated: false,
            };
            if !args.dry_run {
                let vm = self
                    .api
                    .update_virtual_machine_userdata(&machine.id, &userdata)
                    .await?;
                info!(id = %vm.id, "userdata updated");
                update.machine_name = vm.displayname;
                update.updated = vm.id == machine.id;
            }
            updates.push(update);
        }

        Ok(UserdataReport {
            machine_name: args.machine_name.clone(),
            machine_id: args.machine_id.clone(),
            dry_run: args.dry_run,
            updates,
        })
    }

    async fn call(&self, args: &CallArgs) -> Result<crate::core::kernel::Payload, CliError> {
        let params = parse_params(&args.params)?;
        debug!(operation = %args.operation, count = params.len(), "generic call");
        let options = AsyncOptions {
            block: !args.no_wait,
            ..self.api.client().async_options()
        };
        Ok(self
            .api
            .invoke_with(
                &args.operation,
                params,
                args.is_async,
                options,
                &CancellationToken::new(),
            )
            .await?)
    }
}

/// Parse `key=value` arguments. Values may themselves contain `=`.
pub fn parse_params(raw: &[String]) -> Result<ParameterSet, CliError> {
    let mut params = ParameterSet::new();
    for item in raw {
        match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                params.insert(key, value);
            }
            _ => {
                return Err(CliError::Usage(format!(
                    "parameter '{item}' is not of the form key=value"
                )))
            }
        }
    }
    Ok(params)
}

async fn encode_file(path: &Path) -> Result<String, CliError> {
    let data = tokio::fs::read(path).await?;
    Ok(STANDARD.encode(data))
}

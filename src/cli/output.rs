//! Table and JSON rendering for command results.

use std::io::Write;

use serde::Serialize;

use crate::cli::args::Format;
use crate::cli::error::CliError;
use crate::cloudstack::converters::{
    MachineSummary, NetworkSummary, OfferingSummary, TemplateSummary,
};
use crate::core::kernel::Payload;

#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a value in the selected format.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

pub trait TableDisplay {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// `list-machines`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MachineNames {
    pub names: Vec<String>,
}

impl TableDisplay for MachineNames {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for name in &self.names {
            writeln!(writer, "{name}")?;
        }
        Ok(())
    }
}

/// `get-machine-info`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MachineTable {
    pub machines: Vec<MachineSummary>,
}

impl TableDisplay for MachineTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{:<50} {:<18} {:<36} {:<36} {:<36}",
            "Display Name", "IP Address", "VM ID", "Offering", "Zone Name"
        )?;
        for m in &self.machines {
            writeln!(
                writer,
                "{:<50} {:<18} {:<36} {:<36} {:<36}",
                m.name, m.ipaddress, m.id, m.offering, m.zonename
            )?;
        }
        Ok(())
    }
}

/// `get-machines-ips`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct IpList {
    pub ips: Vec<String>,
}

impl TableDisplay for IpList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.ips.join(" "))?;
        Ok(())
    }
}

/// `list-networks`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct NetworkNames {
    pub networks: Vec<NetworkSummary>,
}

impl TableDisplay for NetworkNames {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for n in &self.networks {
            writeln!(writer, "{:<50} {}", n.name, n.cidr)?;
        }
        Ok(())
    }
}

/// `get-network-info`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct NetworkTable {
    pub networks: Vec<NetworkSummary>,
}

impl TableDisplay for NetworkTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{:<50} {:<18} {:<36} {:<36}",
            "Network Name", "CIDR", "Network ID", "Zone Name"
        )?;
        for n in &self.networks {
            writeln!(
                writer,
                "{:<50} {:<18} {:<36} {:<36}",
                n.name, n.cidr, n.id, n.zonename
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TemplateTable {
    pub templates: Vec<TemplateSummary>,
}

impl TableDisplay for TemplateTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{:<35} {:<35} {:<36} {:<36}",
            "Template Description", "OS Type", "Template ID", "Zone Name"
        )?;
        for t in &self.templates {
            writeln!(
                writer,
                "{:<35} {:<35} {:<36} {:<36}",
                t.displaytext, t.ostypename, t.id, t.zonename
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OfferingTable {
    pub offerings: Vec<OfferingSummary>,
}

impl TableDisplay for OfferingTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<25} {:<30} {:<30}", "Offering Name", "Description", "Id")?;
        for o in &self.offerings {
            writeln!(writer, "{:<25} {:<30} {:<30}", o.name, o.displaytext, o.id)?;
        }
        Ok(())
    }
}

/// `generate-template`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DeploymentLines {
    pub lines: Vec<String>,
}

impl TableDisplay for DeploymentLines {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for line in &self.lines {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserdataUpdate {
    pub machine_name: String,
    pub id: String,
    pub updated: bool,
}

/// `update-machine-userdata`
#[derive(Debug, Clone, Serialize)]
pub struct UserdataReport {
    pub machine_name: String,
    pub machine_id: Option<String>,
    pub dry_run: bool,
    pub updates: Vec<UserdataUpdate>,
}

impl TableDisplay for UserdataReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.updates.is_empty() {
            writeln!(
                writer,
                "No machine found for {} id on {}",
                self.machine_id.as_deref().unwrap_or("None"),
                self.machine_name
            )?;
            return Ok(());
        }
        for update in &self.updates {
            writeln!(
                writer,
                "Update userdata on {} with id {}",
                self.machine_name, update.id
            )?;
            if update.updated {
                writeln!(
                    writer,
                    "Userdata for virtual machine {} with {} ID updated",
                    update.machine_name, update.id
                )?;
            }
        }
        Ok(())
    }
}

/// `call`; always JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RawPayload {
    pub payload: Payload,
}

impl TableDisplay for RawPayload {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut *writer, &self.payload)
            .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Serialize + TableDisplay>(format: Format, value: &T) -> String {
        let mut buf = Vec::new();
        OutputFormat::new(format).write(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_ip_list_table_and_json() {
        let ips = IpList {
            ips: vec!["10.0.0.1".into(), "10.0.0.2".into()],
        };
        assert_eq!(render(Format::Table, &ips), "10.0.0.1 10.0.0.2\n");

        let json: Vec<String> = serde_json::from_str(&render(Format::Json, &ips)).unwrap();
        assert_eq!(json.len(), 2);
    }

    #[test]
    fn test_offering_table_columns() {
        let table = OfferingTable {
            offerings: vec![OfferingSummary {
                name: "Small".into(),
                displaytext: "1 vCPU".into(),
                id: "so-1".into(),
            }],
        };
        let out = render(Format::Table, &table);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Offering Name"));
        assert!(lines[1].starts_with(&format!("{:<25} {:<30} so-1", "Small", "1 vCPU")));
    }

    #[test]
    fn test_userdata_report_without_matches() {
        let report = UserdataReport {
            machine_name: "web01".into(),
            machine_id: Some("vm-9".into()),
            dry_run: false,
            updates: Vec::new(),
        };
        assert_eq!(
            render(Format::Table, &report),
            "No machine found for vm-9 id on web01\n"
        );
    }

    #[test]
    fn test_raw_payload_is_json_in_table_mode() {
        let mut payload = Payload::new();
        payload.insert("count".into(), serde_json::json!(2));
        let out = render(Format::Table, &RawPayload { payload });
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["count"], 2);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nic {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ipaddress: Option<String>,
    #[serde(default)]
    pub networkid: Option<String>,
    #[serde(default)]
    pub networkname: Option<String>,
    #[serde(default)]
    pub isdefault: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displayname: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zoneid: String,
    #[serde(default)]
    pub zonename: String,
    #[serde(default)]
    pub serviceofferingid: Option<String>,
    #[serde(default)]
    pub serviceofferingname: String,
    #[serde(default)]
    pub templateid: Option<String>,
    #[serde(default)]
    pub projectid: Option<String>,
    #[serde(default)]
    pub nic: Vec<Nic>,
}

impl VirtualMachine {
    /// Address of the first NIC, which is what the machine is known by.
    pub fn primary_ip(&self) -> Option<&str> {
        self.nic.first().and_then(|nic| nic.ipaddress.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: Option<String>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub zoneid: String,
    #[serde(default)]
    pub zonename: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
    #[serde(default)]
    pub ostypename: String,
    #[serde(default)]
    pub zoneid: Option<String>,
    #[serde(default)]
    pub zonename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
    #[serde(default)]
    pub cpunumber: Option<u32>,
    #[serde(default)]
    pub memory: Option<u64>,
}

/// Values accepted by `listTemplates`' `templatefilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFilter {
    Featured,
    SelfOwned,
    Executable,
    Community,
    All,
}

impl TemplateFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::SelfOwned => "self",
            Self::Executable => "executable",
            Self::Community => "community",
            Self::All => "all",
        }
    }
}

/// The endpoints of an Azure cloud.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    pub name: &'static str,
    pub resource_manager_endpoint: &'static str,
    pub active_directory_endpoint: &'static str,
}

pub const PUBLIC_CLOUD: Environment = Environment {
    name: "AzurePublicCloud",
    resource_manager_endpoint: "https://management.azure.com/",
    active_directory_endpoint: "https://login.microsoftonline.com/",
};

pub const CHINA_CLOUD: Environment = Environment {
    name: "AzureChinaCloud",
    resource_manager_endpoint: "https://management.chinacloudapi.cn/",
    active_directory_endpoint: "https://login.chinacloudapi.cn/",
};

pub const US_GOVERNMENT_CLOUD: Environment = Environment {
    name: "AzureUSGovernmentCloud",
    resource_manager_endpoint: "https://management.usgovcloudapi.net/",
    active_directory_endpoint: "https://login.microsoftonline.us/",
};

pub const GERMAN_CLOUD: Environment = Environment {
    name: "AzureGermanCloud",
    resource_manager_endpoint: "https://management.microsoftazure.de/",
    active_directory_endpoint: "https://login.microsoftonline.de/",
};

// Names are matched case-insensitively.
static NAMES: [(&str, &Environment); 6] = [
    ("AzurePublicCloud", &PUBLIC_CLOUD),
    ("AzureCloud", &PUBLIC_CLOUD),
    ("AzureChinaCloud", &CHINA_CLOUD),
    ("AzureUSGovernmentCloud", &US_GOVERNMENT_CLOUD),
    ("AzureUSGovernment", &US_GOVERNMENT_CLOUD),
    ("AzureGermanCloud", &GERMAN_CLOUD),
];

// === impl Environment ===

impl Environment {
    pub fn from_name(name: &str) -> Option<&'static Self> {
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, env)| *env)
    }

    /// The resource manager endpoint, without a trailing slash.
    pub fn resource_manager(&self) -> &'static str {
        self.resource_manager_endpoint.trim_end_matches('/')
    }
}

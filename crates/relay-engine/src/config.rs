//! Static description of a single relay target (spec.md §4.5, §6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Grpc,
    Http,
    Https,
}

impl Transport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "grpc" => Some(Self::Grpc),
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub health_check_path: String,
    pub insecure: bool,
}

impl RelayTarget {
    pub fn grpc_endpoint(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    pub fn http_endpoint(&self) -> String {
        format!(
            "{}://{}:{}{}",
            match self.transport {
                Transport::Https => "https",
                _ => "http",
            },
            self.host,
            self.port,
            self.path
        )
    }

    pub fn http_health_endpoint(&self) -> String {
        format!(
            "{}://{}:{}{}",
            match self.transport {
                Transport::Https => "https",
                _ => "http",
            },
            self.host,
            self.port,
            self.health_check_path
        )
    }
}

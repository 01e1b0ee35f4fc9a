use super::*;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct General {
    // directory scanned for daemon admin sockets
    #[serde(default = "socket_dir")]
    socket_dir: PathBuf,

    // glob matched against socket file names, `*` and `?` are wildcards
    #[serde(default = "socket_pattern")]
    socket_pattern: String,

    // destination for metric values and latency state
    #[serde(default = "output_dir")]
    output_dir: PathBuf,

    #[serde(default = "admin_command")]
    admin_command: String,

    // leading component of the perf dump section, eg `client` in
    // `client.rgw.a`
    #[serde(default = "section_prefix")]
    section_prefix: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            socket_dir: socket_dir(),
            socket_pattern: socket_pattern(),
            output_dir: output_dir(),
            admin_command: admin_command(),
            section_prefix: section_prefix(),
        }
    }
}

impl General {
    pub fn check(&self) -> Result<()> {
        if self.socket_pattern.is_empty() {
            return Err(Error::Config("general.socket_pattern must not be empty".into()));
        }

        if self.socket_pattern.contains('/') {
            return Err(Error::Config(
                "general.socket_pattern matches file names and must not contain '/'".into(),
            ));
        }

        if self.admin_command.trim().is_empty() {
            return Err(Error::Config("general.admin_command must not be empty".into()));
        }

        if self.section_prefix.is_empty() {
            return Err(Error::Config("general.section_prefix must not be empty".into()));
        }

        Ok(())
    }

    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    pub fn socket_pattern(&self) -> &str {
        &self.socket_pattern
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn admin_command(&self) -> &str {
        &self.admin_command
    }

    pub fn section_prefix(&self) -> &str {
        &self.section_prefix
    }
}

//! Operator console surface.
//!
//! One entry point takes the argument string of an admin console command
//! and returns the text to print back. Runtime toggles act immediately on
//! in-flight configuration; nothing here persists across restarts.

use crate::service::ApprovalService;

const HELP: &str = "\
gateway commands:
  help             show this help
  status           show enablement and connection state
  enable           enable the gateway (requires configured URL and token)
  disable          disable the gateway
  dryrun [off]     force ALLOW delivery while still making real calls
  debug [level]    set the log level (default: debug)
  stats            dump the statistics document";

impl ApprovalService {
    /// Handle one operator console command, returning the text to display.
    pub fn console_command(&self, arguments: &str) -> String {
        let mut parts = arguments.split_whitespace();
        let subcommand = parts.next().unwrap_or("").to_lowercase();

        match subcommand.as_str() {
            "" | "help" => HELP.to_string(),

            "enable" => {
                if !self.has_credentials {
                    return "Cannot enable: base URL and API token are not configured."
                        .to_string();
                }
                self.dispatcher.set_enabled(true);
                "Approval gateway enabled.".to_string()
            }

            "disable" => {
                self.dispatcher.set_enabled(false);
                "Approval gateway disabled.".to_string()
            }

            "status" => format!(
                "enabled={} dryRun={} failOpen={} galaxyId={} streamConnected={} walPending={}",
                self.dispatcher.is_enabled(),
                self.dispatcher.is_dry_run(),
                self.dispatcher.fail_open(),
                self.galaxy_id(),
                self.is_stream_connected(),
                self.stream_pending_count(),
            ),

            "dryrun" => {
                let enable = !matches!(parts.next(), Some("off"));
                self.dispatcher.set_dry_run(enable);
                if enable {
                    "Dry run enabled: all delivered results forced to ALLOW.".to_string()
                } else {
                    "Dry run disabled.".to_string()
                }
            }

            "debug" | "loglevel" => {
                let level = parts.next().unwrap_or("debug");
                match &self.log_handle {
                    Some(handle) if handle.set_level(level) => {
                        format!("Log level set to {}.", level)
                    }
                    Some(_) => format!("Invalid log level: {}", level),
                    None => "Log level reloading is not available.".to_string(),
                }
            }

            "stats" => serde_json::to_string_pretty(&self.stats_as_json())
                .unwrap_or_else(|e| format!("Failed to render stats: {}", e)),

            other => format!("Unknown subcommand: {} (try 'help')", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::GatewayConfig;
    use tempfile::tempdir;

    fn service(base_url: &str, token: &str) -> (tempfile::TempDir, ApprovalService) {
        let dir = tempdir().unwrap();
        let mut config = GatewayConfig::default();
        config.base_url = base_url.to_string();
        config.api_token = token.to_string();
        config.galaxy_id = 2;
        config.worker_threads = 1;
        config.wal_dir = dir.path().join("wal").to_string_lossy().into_owned();
        let service = ApprovalService::new(config, None).unwrap();
        (dir, service)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enable_refused_without_credentials() {
        let (_dir, service) = service("", "");
        let reply = service.console_command("enable");
        assert!(reply.contains("not configured"));
        assert!(!service.is_enabled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enable_disable_toggle() {
        let (_dir, service) = service("https://api.example.com", "secret");
        assert!(service.is_enabled());

        assert_eq!(service.console_command("disable"), "Approval gateway disabled.");
        assert!(!service.is_enabled());

        assert_eq!(service.console_command("enable"), "Approval gateway enabled.");
        assert!(service.is_enabled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dryrun_toggle() {
        let (_dir, service) = service("https://api.example.com", "secret");

        let reply = service.console_command("dryrun");
        assert!(reply.contains("enabled"));
        assert!(service.dispatcher.is_dry_run());

        let reply = service.console_command("dryrun off");
        assert!(reply.contains("disabled"));
        assert!(!service.dispatcher.is_dry_run());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_status_and_stats() {
        let (_dir, service) = service("", "");

        let status = service.console_command("status");
        assert!(status.contains("enabled=false"));
        assert!(status.contains("galaxyId=0"));

        let stats = service.console_command("stats");
        assert!(stats.contains("\"trxCount\""));
        assert!(stats.contains("\"streaming\""));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_help_and_unknown() {
        let (_dir, service) = service("", "");
        assert!(service.console_command("").contains("gateway commands"));
        assert!(service.console_command("help").contains("dryrun"));
        assert!(service.console_command("bogus").contains("Unknown subcommand"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_debug_without_reload_handle() {
        let (_dir, service) = service("", "");
        let reply = service.console_command("debug trace");
        assert!(reply.contains("not available"));
    }
}

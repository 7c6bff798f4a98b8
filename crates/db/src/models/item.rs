//! Item rows joined with their host.

use serde::Serialize;
use sqlx::FromRow;
use logtrigger_core::types::DbId;

/// An item together with the host data the trigger form needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemContext {
    pub id: DbId,
    pub name: String,
    pub key_: String,
    pub value_type: i16,
    pub host_id: DbId,
    /// Technical host name used inside expressions.
    pub host: String,
    /// Visible host name.
    pub host_name: String,
    pub template_id: Option<DbId>,
    /// Visible name of the template host when the item is inherited.
    pub template_host_name: Option<String>,
}

impl ItemContext {
    /// `<host>: <item>` label shown in the disabled item box. Inherited items
    /// are labelled with their template's host.
    pub fn display_name(&self) -> String {
        let host = self
            .template_host_name
            .as_deref()
            .unwrap_or(&self.host_name);
        format!("{host}: {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(template_host_name: Option<&str>) -> ItemContext {
        ItemContext {
            id: 100,
            name: "Syslog".to_string(),
            key_: "log[/var/log/syslog]".to_string(),
            value_type: 2,
            host_id: 1,
            host: "srv1".to_string(),
            host_name: "Server 1".to_string(),
            template_id: template_host_name.map(|_| 10),
            template_host_name: template_host_name.map(str::to_string),
        }
    }

    #[test]
    fn plain_item_uses_its_host() {
        assert_eq!(item(None).display_name(), "Server 1: Syslog");
    }

    #[test]
    fn inherited_item_uses_template_host() {
        assert_eq!(item(Some("Template OS")).display_name(), "Template OS: Syslog");
    }
}

use crate::app::Screen;

pub struct Keybinds;

impl Default for Keybinds {
    fn default() -> Self {
        Self
    }
}

const GENERAL: &str = r#"General:
  ?             Toggle this help
  g             Go to a location (paste an OAuth redirect here)
  Shift + E     Show latest error details
  Ctrl + Q      Quit
"#;

impl Keybinds {
    pub fn help_text(&self, screen: Screen) -> String {
        let screen_keys = match screen {
            Screen::Wizard => {
                r#"Connect wizard:
  ↑ / ↓         Move selection
  Enter         Choose / submit / validate
  Tab           Switch between API key and base URL
  Esc           Back one step
  r             Reload connectors
  d             Go to dashboard
"#
            }
            Screen::Dashboard => {
                r#"Connections:
  ↑ / ↓         Move selection
  Enter         Explore connection
  v             Validate selected connection
  x             Revoke selected connection
  r             Refresh now
  n             Connect a new service
"#
            }
            Screen::Explorer => {
                r#"Explorer:
  ← / →         Previous / next tab
  1-4           Jump to tab
  ↑ / ↓         Move selection
  Enter         Open container or item
  /             Search items
  a             All containers (clear filter)
  c             New item
  m             Comment on the open item
  r             Reload tab
  Esc           Back to dashboard
"#
            }
        };
        format!("Keyboard Shortcuts:\n\n{screen_keys}\n{GENERAL}")
    }
}

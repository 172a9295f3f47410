use ratatui::layout::{Constraint, Direction, Layout, Rect};

use super::panel::{Panel, PanelType};

const TOPBAR_HEIGHT: u16 = 1;
const PROMPT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;

#[derive(Default)]
pub struct LayoutState {
    cached_panels: Vec<Panel>,
}

impl LayoutState {
    /// The prompt row only takes space while a prompt is open.
    pub fn calculate_layout(&mut self, area: Rect, with_prompt: bool) -> &[Panel] {
        let prompt_height = if with_prompt { PROMPT_HEIGHT } else { 0 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TOPBAR_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(prompt_height),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);

        self.cached_panels = vec![
            Panel {
                panel_type: PanelType::Topbar,
                rect: rows[0],
            },
            Panel {
                panel_type: PanelType::Body,
                rect: rows[1],
            },
        ];
        if with_prompt {
            self.cached_panels.push(Panel {
                panel_type: PanelType::Prompt,
                rect: rows[2],
            });
        }
        self.cached_panels.push(Panel {
            panel_type: PanelType::StatusBar,
            rect: rows[3],
        });

        &self.cached_panels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_height(panels: &[Panel]) -> Option<u16> {
        panels
            .iter()
            .find(|p| p.panel_type == PanelType::Body)
            .map(|p| p.rect.height)
    }

    #[test]
    fn prompt_panel_only_when_requested() {
        let mut layout = LayoutState::default();
        let area = Rect::new(0, 0, 80, 24);

        let panels = layout.calculate_layout(area, false);
        assert_eq!(panels.len(), 3);
        assert_eq!(body_height(panels), Some(22));

        let panels = layout.calculate_layout(area, true);
        assert_eq!(panels.len(), 4);
        assert_eq!(panels[2].panel_type, PanelType::Prompt);
        assert_eq!(body_height(panels), Some(19));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Editor,
    Grid,
}

impl Focus {
    /// Next pane for Tab. The sidebar is skipped while hidden.
    pub fn next(self, sidebar_visible: bool) -> Self {
        match self {
            Focus::Sidebar => Focus::Editor,
            Focus::Editor => Focus::Grid,
            Focus::Grid if sidebar_visible => Focus::Sidebar,
            Focus::Grid => Focus::Editor,
        }
    }

    /// Previous pane for Shift+Tab.
    pub fn prev(self, sidebar_visible: bool) -> Self {
        match self {
            Focus::Sidebar => Focus::Grid,
            Focus::Editor if sidebar_visible => Focus::Sidebar,
            Focus::Editor => Focus::Grid,
            Focus::Grid => Focus::Editor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Focus::Sidebar => "SIDEBAR",
            Focus::Editor => "EDITOR",
            Focus::Grid => "RESULTS",
        }
    }
}

/// How the results area shows the active tab's result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultsMode {
    #[default]
    Table,
    Chart,
}

impl ResultsMode {
    pub fn toggle(self) -> Self {
        match self {
            ResultsMode::Table => ResultsMode::Chart,
            ResultsMode::Chart => ResultsMode::Table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_cycles_through_visible_panes() {
        assert_eq!(Focus::Sidebar.next(true), Focus::Editor);
        assert_eq!(Focus::Editor.next(true), Focus::Grid);
        assert_eq!(Focus::Grid.next(true), Focus::Sidebar);
        assert_eq!(Focus::Grid.next(false), Focus::Editor);

        assert_eq!(Focus::Editor.prev(true), Focus::Sidebar);
        assert_eq!(Focus::Editor.prev(false), Focus::Grid);
    }

    #[test]
    fn results_mode_toggles() {
        assert_eq!(ResultsMode::default().toggle(), ResultsMode::Chart);
        assert_eq!(ResultsMode::Chart.toggle(), ResultsMode::Table);
    }
}

mod chart;
mod columns_menu;
mod editor;
mod grid;
mod help_popup;
mod palette;
mod sidebar;
mod tabs;
mod toolbar;

use ratatui::layout::Rect;

pub use chart::{stats_line, ResultsChart};
pub use columns_menu::{ColumnsAction, ColumnsMenu};
pub use editor::{LinePrompt, PromptAction, PromptKind, QueryEditor};
pub use grid::{DataGrid, GridKeyResult, GridState};
pub use help_popup::{HelpAction, HelpPopup};
pub use palette::{builtin_items, CommandPalette, PaletteAction, PaletteItem, PaletteResult};
pub use sidebar::{filter_predefined, format_timestamp, Sidebar, SidebarAction, SidebarSection};
pub use tabs::TabBar;
pub use toolbar::{format_thousands, results_summary, Toolbar};

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

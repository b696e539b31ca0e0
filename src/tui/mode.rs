use ratatui::layout::Rect;

// state local to tui, needed to resolve mouse positions and keys
// into semantic inputevents
// canvas_area and playing are synced each loop
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    // inner area of the canvas panel, as last rendered
    pub canvas_area: Rect,
    // left button went down inside the canvas and hasn't come up yet
    pub pen_down: bool,
    // synced from DisplayState each frame
    pub playing: bool,
}

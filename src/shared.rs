// The input plan:
//
// Canvas:
//   left-drag            //  DrawAt(x, y) in canvas pixels, one per mouse event
//   release              //  PenUp
//
// Buttons:
//   Space / Enter        //  BeatIt (ignored while a beat is playing)
//   c                    //  ClearCanvas
//   [ / ]                //  Thinner / Thicker line (1-20 px)
//
// Quit:
//   Esc / q              //  Quit
//
// Same deal as the rendering side: the TUI only resolves keys and mouse
// positions into these events, the middle layer decides what they mean, and
// each frame the TUI just draws whatever `DisplayState` says.

pub const CANVAS_WIDTH: usize = 800;
pub const CANVAS_HEIGHT: usize = 400;
pub const PROFILE_LEN: usize = CANVAS_WIDTH; // one intensity sample per canvas column
pub const LOOP_SECONDS: u32 = 10; // every episode is exactly this long
pub const FEED_WINDOW: usize = 32; // bars in the visualizer

pub const MIN_THICKNESS: u32 = 1;
pub const MAX_THICKNESS: u32 = 20;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // canvas, already mapped from terminal cells to canvas pixels
    DrawAt(f64, f64),
    PenUp,

    // buttons
    BeatIt,
    ClearCanvas,
    Thinner,
    Thicker,

    // quit button (esc)
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub playing: bool,
    pub bpm: Option<u32>, // tempo of the current/last episode
    pub line_thickness: u32,
    pub status_text: String,
    pub ink: Vec<(f64, f64)>, // canvas-space points to plot, y grows downward
    pub bars: Vec<f64>, // feed window intensities, oldest first
    pub playhead: f64, // 0..1 through the loop
    pub elapsed: Option<f64>, // seconds into the running loop
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            playing: false,
            bpm: None,
            line_thickness: 2,
            status_text: String::new(),
            ink: Vec::new(),
            bars: Vec::new(),
            playhead: 0.0,
            elapsed: None,
        }
    }
}

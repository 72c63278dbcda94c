//! HID keypad view model.
//!
//! Pure data/logic for the remote-input keypad shown while the HID keyboard
//! profile is active: a two-row button grid with cursor navigation, press and
//! release forwarding through a [`ButtonSink`], and connected-status screen
//! selection. Rendering and the GATT report encoding are external.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Number of buttons in the top row.
const TOP_ROW_LEN: u8 = 12;

/// Number of buttons in the bottom row.
const BOTTOM_ROW_LEN: u8 = 4;

/// Total number of logical buttons.
pub const BUTTON_COUNT: u8 = TOP_ROW_LEN + BOTTOM_ROW_LEN;

/// Identifier of a logical keypad button, 1 through [`BUTTON_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonId(u8);

impl ButtonId {
    /// Validate a raw button number. Returns `None` outside 1..=16.
    #[must_use]
    pub fn new(raw: u8) -> Option<Self> {
        if (1..=BUTTON_COUNT).contains(&raw) {
            Some(ButtonId(raw))
        } else {
            None
        }
    }

    /// The raw button number.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Receiver of button press/release events, typically the HID GATT report
/// writer.
pub trait ButtonSink {
    /// A button went down.
    fn press(&mut self, button: ButtonId);
    /// A button came up.
    fn release(&mut self, button: ButtonId);
    /// Release every button the peer may believe is held, e.g. after a
    /// disconnect or a panic gesture.
    fn release_all(&mut self);
}

/// Cursor movement input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavKey {
    /// Move the cursor up one row.
    Up,
    /// Move the cursor down one row.
    Down,
    /// Move the cursor left within the row.
    Left,
    /// Move the cursor right within the row.
    Right,
}

/// Which screen the view should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Not connected: show the pairing/waiting screen.
    Waiting,
    /// Connected: show the keypad grid.
    Keypad,
}

/// Keypad state: cursor position, held button, connection status.
///
/// Navigation clamps at the grid edges. Moving between rows clamps the
/// column to the target row's width so the cursor always points at a real
/// button.
#[derive(Debug, Clone)]
pub struct KeypadModel {
    row: u8,
    col: u8,
    held: Option<ButtonId>,
    connected: bool,
}

impl Default for KeypadModel {
    fn default() -> Self {
        KeypadModel::new()
    }
}

impl KeypadModel {
    /// Fresh model: cursor on button 1, nothing held, not connected.
    #[must_use]
    pub fn new() -> Self {
        KeypadModel {
            row: 0,
            col: 0,
            held: None,
            connected: false,
        }
    }

    fn row_len(row: u8) -> u8 {
        if row == 0 {
            TOP_ROW_LEN
        } else {
            BOTTOM_ROW_LEN
        }
    }

    /// The button currently under the cursor.
    #[must_use]
    pub fn selected(&self) -> ButtonId {
        let number = if self.row == 0 {
            self.col + 1
        } else {
            TOP_ROW_LEN + self.col + 1
        };
        // The cursor is kept inside the grid by navigate(), so the number is
        // always in range.
        ButtonId::new(number).unwrap_or(ButtonId(1))
    }

    /// Move the cursor; clamped at the grid edges.
    pub fn navigate(&mut self, key: NavKey) {
        match key {
            NavKey::Up => self.row = self.row.saturating_sub(1),
            NavKey::Down => {
                if self.row == 0 {
                    self.row = 1;
                }
            }
            NavKey::Left => self.col = self.col.saturating_sub(1),
            NavKey::Right => {
                if self.col + 1 < Self::row_len(self.row) {
                    self.col += 1;
                }
            }
        }
        // Row changes can leave the column past the end of a shorter row.
        let max_col = Self::row_len(self.row) - 1;
        if self.col > max_col {
            self.col = max_col;
        }
    }

    /// Ok went down: press the selected button and remember it so the
    /// matching release targets the same button even if the cursor moves.
    pub fn ok_press(&mut self, sink: &mut impl ButtonSink) {
        let button = self.selected();
        self.held = Some(button);
        sink.press(button);
    }

    /// Ok came up: release the held button, if any.
    pub fn ok_release(&mut self, sink: &mut impl ButtonSink) {
        if let Some(button) = self.held.take() {
            sink.release(button);
        }
    }

    /// Long Back: release everything the peer may believe is held.
    pub fn back_long(&mut self, sink: &mut impl ButtonSink) {
        self.held = None;
        sink.release_all();
    }

    /// Update the connection status. Losing the connection releases any
    /// held button locally; the peer is gone and cannot receive the release.
    pub fn set_connected(&mut self, connected: bool) {
        if !connected {
            self.held = None;
        }
        self.connected = connected;
    }

    /// Current connection status.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Which screen to render for the current status.
    #[must_use]
    pub fn screen(&self) -> Screen {
        if self.connected {
            Screen::Keypad
        } else {
            Screen::Waiting
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        presses: Vec<u8>,
        releases: Vec<u8>,
        release_alls: u32,
    }

    impl ButtonSink for RecordingSink {
        fn press(&mut self, button: ButtonId) {
            self.presses.push(button.get());
        }

        fn release(&mut self, button: ButtonId) {
            self.releases.push(button.get());
        }

        fn release_all(&mut self) {
            self.release_alls += 1;
        }
    }

    #[test]
    fn test_button_id_range() {
        assert!(ButtonId::new(0).is_none());
        assert_eq!(ButtonId::new(1).unwrap().get(), 1);
        assert_eq!(ButtonId::new(16).unwrap().get(), 16);
        assert!(ButtonId::new(17).is_none());
    }

    #[test]
    fn test_new_model_selects_button_one() {
        let model = KeypadModel::new();
        assert_eq!(model.selected().get(), 1);
        assert_eq!(model.screen(), Screen::Waiting);
    }

    #[test]
    fn test_right_navigation_clamps_at_row_end() {
        let mut model = KeypadModel::new();
        for _ in 0..20 {
            model.navigate(NavKey::Right);
        }
        assert_eq!(model.selected().get(), 12, "top row ends at button 12");
    }

    #[test]
    fn test_left_navigation_clamps_at_row_start() {
        let mut model = KeypadModel::new();
        model.navigate(NavKey::Left);
        assert_eq!(model.selected().get(), 1);
    }

    #[test]
    fn test_down_clamps_column_to_shorter_row() {
        let mut model = KeypadModel::new();
        for _ in 0..7 {
            model.navigate(NavKey::Right);
        }
        assert_eq!(model.selected().get(), 8);
        model.navigate(NavKey::Down);
        // Column 7 does not exist in the 4-wide bottom row.
        assert_eq!(model.selected().get(), 16);
    }

    #[test]
    fn test_up_down_round_trip() {
        let mut model = KeypadModel::new();
        model.navigate(NavKey::Right);
        model.navigate(NavKey::Down);
        assert_eq!(model.selected().get(), 14);
        model.navigate(NavKey::Up);
        assert_eq!(model.selected().get(), 2);
        model.navigate(NavKey::Up);
        assert_eq!(model.selected().get(), 2, "up clamps at the top row");
    }

    #[test]
    fn test_ok_press_release_forwards_selected_button() {
        let mut model = KeypadModel::new();
        let mut sink = RecordingSink::default();
        model.navigate(NavKey::Right);
        model.ok_press(&mut sink);
        model.ok_release(&mut sink);
        assert_eq!(sink.presses, [2]);
        assert_eq!(sink.releases, [2]);
    }

    #[test]
    fn test_release_targets_held_button_after_cursor_moves() {
        let mut model = KeypadModel::new();
        let mut sink = RecordingSink::default();
        model.ok_press(&mut sink);
        model.navigate(NavKey::Right);
        model.navigate(NavKey::Right);
        model.ok_release(&mut sink);
        assert_eq!(sink.presses, [1]);
        assert_eq!(sink.releases, [1], "release must target the held button");
    }

    #[test]
    fn test_release_without_press_is_a_no_op() {
        let mut model = KeypadModel::new();
        let mut sink = RecordingSink::default();
        model.ok_release(&mut sink);
        assert!(sink.releases.is_empty());
    }

    #[test]
    fn test_long_back_releases_all() {
        let mut model = KeypadModel::new();
        let mut sink = RecordingSink::default();
        model.ok_press(&mut sink);
        model.back_long(&mut sink);
        assert_eq!(sink.release_alls, 1);
        // The held state is gone: a later release has no target.
        model.ok_release(&mut sink);
        assert!(sink.releases.is_empty());
    }

    #[test]
    fn test_connection_status_selects_screen() {
        let mut model = KeypadModel::new();
        model.set_connected(true);
        assert_eq!(model.screen(), Screen::Keypad);
        model.set_connected(false);
        assert_eq!(model.screen(), Screen::Waiting);
    }

    #[test]
    fn test_disconnect_drops_held_button() {
        let mut model = KeypadModel::new();
        let mut sink = RecordingSink::default();
        model.ok_press(&mut sink);
        model.set_connected(false);
        model.ok_release(&mut sink);
        assert!(sink.releases.is_empty());
    }
}

use crate::app::{App, CursorMove};
use crate::input::InputAction;
use std::time::Instant;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::MoveLeft => app.move_cursor(CursorMove::Left),
        InputAction::MoveRight => app.move_cursor(CursorMove::Right),
        InputAction::MoveUp => app.move_cursor(CursorMove::Up),
        InputAction::MoveDown => app.move_cursor(CursorMove::Down),
        InputAction::Flip => app.flip_at_cursor(),
        InputAction::Reshuffle => app.reshuffle(),
        InputAction::RetryDeck => app.retry_deck(),
        InputAction::Continue => app.continue_entry(),
        InputAction::Dismiss => app.dismiss(Instant::now()),
        InputAction::Close => app.close(),
    }
}

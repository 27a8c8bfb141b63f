use winit::keyboard::{KeyCode, PhysicalKey};

use crate::rendering::render_mode::RenderMode;

/// Keys 1-4, or the mode's initial letter, select a render mode.
pub fn mode_for_key(key: PhysicalKey) -> Option<RenderMode> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };

    match code {
        KeyCode::Digit1 | KeyCode::KeyR => Some(RenderMode::Stock),
        KeyCode::Digit2 | KeyCode::KeyE => Some(RenderMode::Explicit),
        KeyCode::Digit3 | KeyCode::KeyB => Some(RenderMode::BindlessConstants),
        KeyCode::Digit4 | KeyCode::KeyM => Some(RenderMode::BindlessMultiDraw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::NativeKeyCode;

    use super::*;

    #[test]
    fn digits_follow_mode_order() {
        let digits = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
        ];

        for (digit, mode) in digits.into_iter().zip(RenderMode::ALL) {
            assert_eq!(mode_for_key(PhysicalKey::Code(digit)), Some(mode));
        }
    }

    #[test]
    fn letters_and_unmapped_keys() {
        assert_eq!(
            mode_for_key(PhysicalKey::Code(KeyCode::KeyM)),
            Some(RenderMode::BindlessMultiDraw)
        );
        assert_eq!(mode_for_key(PhysicalKey::Code(KeyCode::Digit5)), None);
        assert_eq!(
            mode_for_key(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            None
        );
    }
}

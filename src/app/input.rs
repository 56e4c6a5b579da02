#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tumble,
    Truck,
    Zoom,
    Walk,
    Pick,
}

impl Gesture {
    /// Camera gestures need alt (or meta) held; anything else picks.
    pub fn classify(button: PointerButton, modifiers: Modifiers) -> Self {
        if !(modifiers.alt || modifiers.meta) {
            return Gesture::Pick;
        }
        match button {
            PointerButton::Left if modifiers.ctrl => Gesture::Truck,
            PointerButton::Left if modifiers.shift => Gesture::Walk,
            PointerButton::Left => Gesture::Tumble,
            PointerButton::Middle => Gesture::Truck,
            PointerButton::Right => Gesture::Zoom,
            PointerButton::Other => Gesture::Pick,
        }
    }

    pub fn moves_camera(self) -> bool {
        !matches!(self, Gesture::Pick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt() -> Modifiers {
        Modifiers {
            alt: true,
            ..Modifiers::default()
        }
    }

    #[test]
    fn plain_clicks_pick() {
        for button in [PointerButton::Left, PointerButton::Middle, PointerButton::Right] {
            assert_eq!(Gesture::classify(button, Modifiers::default()), Gesture::Pick);
        }
    }

    #[test]
    fn alt_selects_camera_gestures() {
        assert_eq!(Gesture::classify(PointerButton::Left, alt()), Gesture::Tumble);
        assert_eq!(Gesture::classify(PointerButton::Middle, alt()), Gesture::Truck);
        assert_eq!(Gesture::classify(PointerButton::Right, alt()), Gesture::Zoom);

        let meta = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert_eq!(Gesture::classify(PointerButton::Left, meta), Gesture::Tumble);
    }

    #[test]
    fn left_button_modifiers_refine_gesture() {
        let ctrl = Modifiers { ctrl: true, ..alt() };
        let shift = Modifiers { shift: true, ..alt() };
        assert_eq!(Gesture::classify(PointerButton::Left, ctrl), Gesture::Truck);
        assert_eq!(Gesture::classify(PointerButton::Left, shift), Gesture::Walk);
        assert!(Gesture::Walk.moves_camera());
        assert!(!Gesture::Pick.moves_camera());
    }
}

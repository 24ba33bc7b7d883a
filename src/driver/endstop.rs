//! Endstop switch input.

use embedded_hal::digital::InputPin;

/// Homing switch on an embedded-hal input pin.
pub struct Endstop<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> Endstop<P> {
    /// Wrap a pin. `active_low` is true when the switch pulls the line low.
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Whether the switch is currently asserted.
    pub fn is_triggered(&mut self) -> Result<bool, P::Error> {
        if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        }
    }

    /// Polarity of the switch.
    #[inline]
    pub fn is_active_low(&self) -> bool {
        self.active_low
    }

    /// Release the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

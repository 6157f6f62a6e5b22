//! Actuators and sensors.
//!
//! [`DeviceControl`] is the hardware boundary. [`DeviceController`] owns the state the
//! hardware cannot report back (which lamps are lit and at what duty cycle) and is the
//! only writer to the devices.

use core::{fmt, str::FromStr};

use serde::Serialize;
use tracing::debug;

use crate::persist::PersistedState;

/// Duty cycle used until one is written or restored.
pub const DEFAULT_LED_PWM: u8 = 25;

pub const MAX_LED_PWM: u8 = 100;

/// Primitive actuator and sensor access.
pub trait DeviceControl {
    fn set_tv(&mut self, on: bool);

    fn tv(&self) -> bool;

    fn set_heater(&mut self, on: bool);

    fn heater(&self) -> bool;

    /// Sets the floor lamp duty cycle, 0 (off) to 100.
    fn dim_floor_lamp(&mut self, duty_cycle: u8);

    /// Sets the ceiling lamp duty cycle, 0 (off) to 100.
    fn dim_ceiling_lamp(&mut self, duty_cycle: u8);

    /// Room temperature in degrees Celsius.
    fn temperature(&self) -> f32;

    fn alarm(&self) -> bool;
}

/// In-memory devices, for running without hardware attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDevices {
    pub tv: bool,
    pub heater: bool,
    pub floor_lamp: u8,
    pub ceiling_lamp: u8,
    pub temperature: f32,
    pub alarm: bool,
}

impl Default for SimulatedDevices {
    fn default() -> Self {
        Self {
            tv: false,
            heater: false,
            floor_lamp: 0,
            ceiling_lamp: 0,
            temperature: 21.5,
            alarm: false,
        }
    }
}

impl DeviceControl for SimulatedDevices {
    fn set_tv(&mut self, on: bool) {
        debug!(on, "TV");
        self.tv = on;
    }

    fn tv(&self) -> bool {
        self.tv
    }

    fn set_heater(&mut self, on: bool) {
        debug!(on, "Heater");
        self.heater = on;
    }

    fn heater(&self) -> bool {
        self.heater
    }

    fn dim_floor_lamp(&mut self, duty_cycle: u8) {
        debug!(duty_cycle, "Floor lamp");
        self.floor_lamp = duty_cycle;
    }

    fn dim_ceiling_lamp(&mut self, duty_cycle: u8) {
        debug!(duty_cycle, "Ceiling lamp");
        self.ceiling_lamp = duty_cycle;
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn alarm(&self) -> bool {
        self.alarm
    }
}

/// Every name a command may address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Utility {
    Tv,
    Heater,
    LampFloor,
    LampCeil,
    LedPwm,
    Temperature,
    Alarm,
}

impl Utility {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Utility::Tv => "tv",
            Utility::Heater => "heater",
            Utility::LampFloor => "lamp_floor",
            Utility::LampCeil => "lamp_ceil",
            Utility::LedPwm => "led_pwm",
            Utility::Temperature => "temperature",
            Utility::Alarm => "alarm",
        }
    }
}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid utility: {0}")]
pub struct UnknownUtility(pub String);

impl FromStr for Utility {
    type Err = UnknownUtility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv" => Ok(Utility::Tv),
            "heater" => Ok(Utility::Heater),
            "lamp_floor" => Ok(Utility::LampFloor),
            "lamp_ceil" => Ok(Utility::LampCeil),
            "led_pwm" => Ok(Utility::LedPwm),
            "temperature" => Ok(Utility::Temperature),
            "alarm" => Ok(Utility::Alarm),
            _ => Err(UnknownUtility(s.to_owned())),
        }
    }
}

/// A value read from a utility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Integer(i64),
    Real(f32),
}

#[derive(Debug)]
pub struct DeviceController<D> {
    devices: D,
    lamp_floor: bool,
    lamp_ceil: bool,
    led_pwm: u8,
}

impl<D: DeviceControl> DeviceController<D> {
    pub const fn new(devices: D) -> Self {
        Self {
            devices,
            lamp_floor: false,
            lamp_ceil: false,
            led_pwm: DEFAULT_LED_PWM,
        }
    }

    pub const fn devices(&self) -> &D {
        &self.devices
    }

    pub fn into_devices(self) -> D {
        self.devices
    }

    pub const fn led_pwm(&self) -> u8 {
        self.led_pwm
    }

    /// Drives every actuator to a known state: TV and heater off, lamps per their flags.
    pub fn reset(&mut self) {
        self.devices.set_tv(false);
        self.devices.set_heater(false);
        self.apply_lamps();
    }

    pub fn read(&self, utility: Utility) -> Reading {
        match utility {
            Utility::Tv => Reading::Integer(self.devices.tv().into()),
            Utility::Heater => Reading::Integer(self.devices.heater().into()),
            Utility::LampFloor => Reading::Integer(self.lamp_floor.into()),
            Utility::LampCeil => Reading::Integer(self.lamp_ceil.into()),
            Utility::LedPwm => Reading::Integer(self.led_pwm.into()),
            Utility::Temperature => Reading::Real(self.devices.temperature()),
            Utility::Alarm => Reading::Integer(self.devices.alarm().into()),
        }
    }

    /// Flips an on/off utility. Returns `false` if the utility cannot be toggled.
    pub fn toggle(&mut self, utility: Utility) -> bool {
        match utility {
            Utility::Tv => {
                let on = !self.devices.tv();
                self.devices.set_tv(on);
            }
            Utility::Heater => {
                let on = !self.devices.heater();
                self.devices.set_heater(on);
            }
            Utility::LampFloor => {
                self.lamp_floor = !self.lamp_floor;
                self.apply_lamps();
            }
            Utility::LampCeil => {
                self.lamp_ceil = !self.lamp_ceil;
                self.apply_lamps();
            }
            Utility::LedPwm | Utility::Temperature | Utility::Alarm => return false,
        }

        true
    }

    /// Sets the lamp duty cycle, clamped to 0..=100, and re-dims the lamps that are lit.
    pub fn set_led_pwm(&mut self, value: i64) -> u8 {
        self.led_pwm = value.clamp(0, MAX_LED_PWM.into()) as u8;
        self.apply_lamps();
        self.led_pwm
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            tv: Some(self.devices.tv().into()),
            heater: Some(self.devices.heater().into()),
            lamp_floor: Some(self.lamp_floor.into()),
            lamp_ceil: Some(self.lamp_ceil.into()),
            led_pwm: Some(self.led_pwm.into()),
        }
    }

    /// Applies the fields present in `state`. Absent fields keep their current value.
    pub fn restore(&mut self, state: &PersistedState) {
        if let Some(tv) = state.tv {
            self.devices.set_tv(tv != 0);
        }

        if let Some(heater) = state.heater {
            self.devices.set_heater(heater != 0);
        }

        if let Some(led_pwm) = state.led_pwm {
            self.led_pwm = led_pwm.clamp(0, MAX_LED_PWM.into()) as u8;
        }

        if let Some(lamp_floor) = state.lamp_floor {
            self.lamp_floor = lamp_floor != 0;
        }

        if let Some(lamp_ceil) = state.lamp_ceil {
            self.lamp_ceil = lamp_ceil != 0;
        }

        self.apply_lamps();
    }

    fn apply_lamps(&mut self) {
        let duty = |lit: bool| if lit { self.led_pwm } else { 0 };

        let floor = duty(self.lamp_floor);
        let ceiling = duty(self.lamp_ceil);

        self.devices.dim_floor_lamp(floor);
        self.devices.dim_ceiling_lamp(ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DeviceController<SimulatedDevices> {
        DeviceController::new(SimulatedDevices::default())
    }

    #[test]
    fn toggle_lamp_uses_duty_cycle() {
        let mut controller = controller();

        assert!(controller.toggle(Utility::LampFloor));
        assert_eq!(controller.devices().floor_lamp, DEFAULT_LED_PWM);
        assert_eq!(controller.read(Utility::LampFloor), Reading::Integer(1));

        assert!(controller.toggle(Utility::LampFloor));
        assert_eq!(controller.devices().floor_lamp, 0);
        assert_eq!(controller.read(Utility::LampFloor), Reading::Integer(0));
    }

    #[test]
    fn toggle_tv_and_heater() {
        let mut controller = controller();

        assert!(controller.toggle(Utility::Tv));
        assert!(controller.toggle(Utility::Heater));

        assert!(controller.devices().tv);
        assert!(controller.devices().heater);
        assert_eq!(controller.read(Utility::Tv), Reading::Integer(1));
    }

    #[test]
    fn sensors_cannot_be_toggled() {
        let mut controller = controller();

        assert!(!controller.toggle(Utility::Temperature));
        assert!(!controller.toggle(Utility::Alarm));
        assert!(!controller.toggle(Utility::LedPwm));
    }

    #[test]
    fn led_pwm_is_clamped_and_redims_lit_lamps() {
        let mut controller = controller();
        controller.toggle(Utility::LampCeil);

        assert_eq!(controller.set_led_pwm(150), 100);
        assert_eq!(controller.devices().ceiling_lamp, 100);
        assert_eq!(controller.devices().floor_lamp, 0);

        assert_eq!(controller.set_led_pwm(-3), 0);
        assert_eq!(controller.devices().ceiling_lamp, 0);
    }

    #[test]
    fn temperature_is_real() {
        assert_eq!(controller().read(Utility::Temperature), Reading::Real(21.5));
    }

    #[test]
    fn snapshot_restore() {
        let mut controller = controller();
        controller.toggle(Utility::Tv);
        controller.toggle(Utility::LampFloor);
        controller.set_led_pwm(60);

        let state = controller.snapshot();

        let mut restored = DeviceController::new(SimulatedDevices::default());
        restored.restore(&state);

        assert_eq!(restored.snapshot(), state);
        assert_eq!(restored.devices().floor_lamp, 60);
        assert!(restored.devices().tv);
    }

    #[test]
    fn restore_keeps_absent_fields() {
        let mut controller = controller();

        controller.restore(&PersistedState {
            led_pwm: Some(80),
            ..PersistedState::default()
        });

        assert_eq!(controller.led_pwm(), 80);
        assert_eq!(controller.read(Utility::Tv), Reading::Integer(0));
    }

    #[test]
    fn utility_names() {
        assert_eq!("lamp_ceil".parse::<Utility>(), Ok(Utility::LampCeil));
        assert_eq!(
            "garage".parse::<Utility>(),
            Err(UnknownUtility("garage".to_owned()))
        );
        assert_eq!(Utility::LedPwm.to_string(), "led_pwm");
    }
}

//! JSON command dispatch.
//!
//! Commands arrive as JSON objects with an `action` of `read`, `write` or `toggle`:
//!
//! ```text
//! {"action":"read","utilities":["tv","temperature"]}
//! {"action":"write","utility":"led_pwm","value":32}
//! {"action":"toggle","utility":"lamp_floor"}
//! ```
//!
//! A `read` answers with a `DataResponse`, everything else with a `CommandResponse`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    Message,
    connection::OnMessage,
    device::{DeviceControl, DeviceController, Utility},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    CommandResponse {
        action: String,
        status: Status,
        message: String,
    },
    DataResponse {
        action: String,
        data: Map<String, Value>,
    },
}

impl Response {
    fn success(action: &str, message: String) -> Self {
        Response::CommandResponse {
            action: action.to_owned(),
            status: Status::Success,
            message,
        }
    }

    fn error(action: &str, message: impl Into<String>) -> Self {
        Response::CommandResponse {
            action: action.to_owned(),
            status: Status::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Response::CommandResponse {
                status: Status::Error,
                ..
            }
        )
    }
}

/// Fields are kept loose so that a wrong type is reported per field, not as invalid JSON.
#[derive(Debug, Deserialize)]
struct RawCommand {
    #[serde(default)]
    action: Value,
    #[serde(default)]
    utility: Value,
    #[serde(default)]
    utilities: Value,
    #[serde(default)]
    value: Value,
}

/// Maps decoded commands onto a [`DeviceController`].
#[derive(Debug)]
pub struct Dispatcher<D> {
    controller: DeviceController<D>,
}

impl<D: DeviceControl> Dispatcher<D> {
    pub const fn new(controller: DeviceController<D>) -> Self {
        Self { controller }
    }

    pub const fn controller(&self) -> &DeviceController<D> {
        &self.controller
    }

    pub const fn controller_mut(&mut self) -> &mut DeviceController<D> {
        &mut self.controller
    }

    pub fn into_controller(self) -> DeviceController<D> {
        self.controller
    }

    /// Executes one command and describes the outcome.
    pub fn dispatch(&mut self, command: &[u8]) -> Response {
        let Ok(command) = serde_json::from_slice::<RawCommand>(command) else {
            return Response::error("-", "Invalid JSON");
        };

        let Some(action) = command.action.as_str() else {
            return Response::error("-", "Missing or invalid action");
        };

        match action {
            "read" => self.read(&command),
            "write" => self.write(&command),
            "toggle" => self.toggle(&command),
            _ => Response::error(action, "Invalid action"),
        }
    }

    fn read(&self, command: &RawCommand) -> Response {
        let names: Vec<&str> = match (&command.utilities, &command.utility) {
            (Value::Array(utilities), _) => utilities.iter().filter_map(Value::as_str).collect(),
            (Value::Null, Value::String(utility)) => vec![utility.as_str()],
            _ => return Response::error("read", "Missing or invalid utilities"),
        };

        let mut data = Map::new();

        // Unknown names are skipped, the rest are still answered.
        for utility in names.into_iter().filter_map(|name| name.parse::<Utility>().ok()) {
            let reading = serde_json::to_value(self.controller.read(utility)).unwrap_or_default();

            data.insert(utility.to_string(), reading);
        }

        Response::DataResponse {
            action: "read".to_owned(),
            data,
        }
    }

    fn write(&mut self, command: &RawCommand) -> Response {
        let (Some(utility), Some(value)) = (command.utility.as_str(), command.value.as_i64())
        else {
            return Response::error("write", "Missing or invalid utility or value");
        };

        match utility.parse::<Utility>() {
            Ok(Utility::LedPwm) => {
                let led_pwm = self.controller.set_led_pwm(value);

                Response::success("write", format!("RLamp set to {led_pwm}"))
            }
            _ => Response::error("write", format!("Invalid utility: {utility}")),
        }
    }

    fn toggle(&mut self, command: &RawCommand) -> Response {
        let Some(utility) = command.utility.as_str() else {
            return Response::error("toggle", "Missing or invalid utility");
        };

        let toggled = utility
            .parse::<Utility>()
            .is_ok_and(|parsed| self.controller.toggle(parsed));

        if toggled {
            Response::success("toggle", format!("{utility} toggled successfully"))
        } else {
            Response::error("toggle", format!("Invalid utility: {utility}"))
        }
    }
}

impl<D: DeviceControl> OnMessage for Dispatcher<D> {
    fn on_message(&mut self, message: Message<'_>) -> Option<Vec<u8>> {
        debug!(?message, "Command");

        let response = self.dispatch(message.as_bytes());

        if response.is_error() {
            warn!(?response, "Command failed");
        }

        match serde_json::to_vec(&response) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(%err, "Cannot serialize response");

                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::device::SimulatedDevices;

    fn dispatcher() -> Dispatcher<SimulatedDevices> {
        Dispatcher::new(DeviceController::new(SimulatedDevices::default()))
    }

    fn dispatch(dispatcher: &mut Dispatcher<SimulatedDevices>, command: Value) -> Value {
        let bytes = dispatcher
            .on_message(Message::Text(&command.to_string()))
            .unwrap();

        serde_json::from_slice(&bytes).unwrap()
    }

    fn error(action: &str, message: &str) -> Value {
        json!({"type": "CommandResponse", "action": action, "status": "Error", "message": message})
    }

    #[test]
    fn read_utilities() {
        let mut dispatcher = dispatcher();

        let response = dispatch(
            &mut dispatcher,
            json!({"action": "read", "utilities": ["tv", "temperature", "led_pwm", "garage"]}),
        );

        assert_eq!(
            response,
            json!({
                "type": "DataResponse",
                "action": "read",
                "data": {"tv": 0, "temperature": 21.5, "led_pwm": 25}
            })
        );
    }

    #[test]
    fn read_single_utility() {
        let mut dispatcher = dispatcher();

        let response = dispatch(&mut dispatcher, json!({"action": "read", "utility": "alarm"}));

        assert_eq!(response["data"], json!({"alarm": 0}));
    }

    #[test]
    fn read_without_utilities() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(&mut dispatcher, json!({"action": "read"})),
            error("read", "Missing or invalid utilities")
        );
    }

    #[test]
    fn write_led_pwm() {
        let mut dispatcher = dispatcher();

        let response = dispatch(
            &mut dispatcher,
            json!({"action": "write", "utility": "led_pwm", "value": 250}),
        );

        assert_eq!(response["status"], "Success");
        assert_eq!(response["message"], "RLamp set to 100");
        assert_eq!(dispatcher.controller().led_pwm(), 100);
    }

    #[test]
    fn write_invalid_utility() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(
                &mut dispatcher,
                json!({"action": "write", "utility": "tv", "value": 1})
            ),
            error("write", "Invalid utility: tv")
        );
    }

    #[test]
    fn write_without_value() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(
                &mut dispatcher,
                json!({"action": "write", "utility": "led_pwm", "value": "max"})
            ),
            error("write", "Missing or invalid utility or value")
        );
    }

    #[test]
    fn toggle() {
        let mut dispatcher = dispatcher();

        let response = dispatch(
            &mut dispatcher,
            json!({"action": "toggle", "utility": "heater"}),
        );

        assert_eq!(
            response,
            json!({
                "type": "CommandResponse",
                "action": "toggle",
                "status": "Success",
                "message": "heater toggled successfully"
            })
        );
        assert!(dispatcher.controller().devices().heater);
    }

    #[test]
    fn toggle_sensor() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(
                &mut dispatcher,
                json!({"action": "toggle", "utility": "temperature"})
            ),
            error("toggle", "Invalid utility: temperature")
        );
    }

    #[test]
    fn invalid_json() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatcher.dispatch(b"{not json"),
            Response::error("-", "Invalid JSON")
        );
    }

    #[test]
    fn missing_action() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(&mut dispatcher, json!({"utility": "tv"})),
            error("-", "Missing or invalid action")
        );
    }

    #[test]
    fn unknown_action() {
        let mut dispatcher = dispatcher();

        assert_eq!(
            dispatch(&mut dispatcher, json!({"action": "explode"})),
            error("explode", "Invalid action")
        );
    }

    #[test]
    fn binary_messages_are_dispatched_too() {
        let mut dispatcher = dispatcher();

        let bytes = dispatcher
            .on_message(Message::Binary(br#"{"action":"toggle","utility":"tv"}"#))
            .unwrap();

        assert!(dispatcher.controller().devices().tv);
        assert!(bytes.starts_with(br#"{"type":"CommandResponse""#));
    }
}

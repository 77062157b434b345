//! Serial port enumeration.

use crate::models::PortEntry;
use serialport::{SerialPortInfo, SerialPortType};

/// Description used when the OS reports nothing useful
pub const UNKNOWN_DESCRIPTION: &str = "n/a";

impl From<SerialPortInfo> for PortEntry {
    fn from(info: SerialPortInfo) -> Self {
        Self {
            description: describe_port_type(&info.port_type),
            device: info.port_name,
        }
    }
}

/// Human-readable description for a port type
pub fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .or_else(|| usb.manufacturer.clone())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("USB Serial Device ({:04x}:{:04x})", usb.vid, usb.pid)),
        SerialPortType::PciPort => "PCI Serial Port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth Serial Port".to_string(),
        SerialPortType::Unknown => UNKNOWN_DESCRIPTION.to_string(),
    }
}

/// Sort key so that ttyACM* ports come first, then ttyUSB*, then the rest by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// Order ports deterministically and drop duplicate device names
pub fn sort_ports(mut ports: Vec<PortEntry>) -> Vec<PortEntry> {
    ports.sort_by_key(|p| port_sort_key(&p.device));
    ports.dedup_by(|a, b| a.device == b.device);
    ports
}

/// List the serial devices currently attached.
///
/// Enumeration failures are logged and produce an empty list.
pub fn list_ports() -> Vec<PortEntry> {
    match serialport::available_ports() {
        Ok(infos) => {
            let ports = sort_ports(infos.into_iter().map(PortEntry::from).collect());
            tracing::debug!("Found {} serial ports", ports.len());
            ports
        }
        Err(e) => {
            tracing::warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(product: Option<&str>, manufacturer: Option<&str>) -> SerialPortType {
        SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x1a86,
            pid: 0x7523,
            serial_number: None,
            manufacturer: manufacturer.map(str::to_string),
            product: product.map(str::to_string),
        })
    }

    #[test]
    fn test_list_ports_does_not_panic() {
        for port in list_ports() {
            assert!(!port.device.is_empty());
        }
    }

    #[test]
    fn test_describe_usb_port() {
        assert_eq!(
            describe_port_type(&usb(Some("USB-SERIAL CH340"), Some("wch.cn"))),
            "USB-SERIAL CH340"
        );
        assert_eq!(describe_port_type(&usb(None, Some("FTDI"))), "FTDI");
        assert_eq!(
            describe_port_type(&usb(None, None)),
            "USB Serial Device (1a86:7523)"
        );
    }

    #[test]
    fn test_describe_other_ports() {
        assert_eq!(describe_port_type(&SerialPortType::Unknown), "n/a");
        assert_eq!(
            describe_port_type(&SerialPortType::PciPort),
            "PCI Serial Port"
        );
    }

    #[test]
    fn test_port_entry_from_info() {
        let entry = PortEntry::from(SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(entry.to_string(), "/dev/ttyS0 - n/a");
    }

    #[test]
    fn test_port_sorting() {
        let ports = [
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
            "/dev/ttyUSB0",
        ]
        .into_iter()
        .map(|n| PortEntry {
            device: n.to_string(),
            description: UNKNOWN_DESCRIPTION.to_string(),
        })
        .collect();

        let names: Vec<String> = sort_ports(ports).into_iter().map(|p| p.device).collect();
        assert_eq!(
            names,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }
}

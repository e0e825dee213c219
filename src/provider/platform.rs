//! Native Wifi API provider for Windows.
//!
//! This is the only module that talks to the OS radio. Scan results are
//! reported one record per BSS entry, in the order the OS returns them;
//! the session layer decides what to do with duplicates.

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use secrecy::ExposeSecret;
use tracing::info;
use windows::{
    Win32::{
        Foundation::{ERROR_SUCCESS, HANDLE},
        NetworkManagement::WiFi::*,
    },
    core::{GUID, PCWSTR},
};

use crate::error::{WifiError, WifiResult};
use crate::provider::{
    ConnectRequest, NetworkRecord, PermissionRationale, PermissionStatus, WifiProvider,
};

/// Time for the radio to finish surveying after a scan request
const SCAN_SETTLE_MS: u64 = 2000;
/// Time for the system to register a freshly written profile
const PROFILE_REGISTRATION_DELAY_MS: u64 = 1500;

#[derive(Debug, Default)]
pub struct PlatformProvider;

impl PlatformProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Safe wrapper around a WLAN client handle, closed on drop
#[derive(Debug)]
struct WlanHandle {
    handle: HANDLE,
}

impl WlanHandle {
    fn open() -> WifiResult<Self> {
        let mut negotiated_version = 0;
        let mut handle = HANDLE::default();
        unsafe {
            let result = WlanOpenHandle(2, None, &mut negotiated_version, &mut handle);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::Internal(format!(
                    "failed to open WLAN handle (code: {result})"
                )));
            }
        }
        Ok(Self { handle })
    }

    fn as_raw(&self) -> HANDLE {
        self.handle
    }

    /// GUID of the first wireless interface
    fn interface_guid(&self) -> WifiResult<GUID> {
        unsafe {
            let mut interface_list: *mut WLAN_INTERFACE_INFO_LIST = std::ptr::null_mut();
            let result = WlanEnumInterfaces(self.handle, None, &mut interface_list);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::Internal(format!(
                    "failed to enumerate interfaces (code: {result})"
                )));
            }

            if (*interface_list).dwNumberOfItems == 0 {
                WlanFreeMemory(interface_list as *mut _);
                return Err(WifiError::NoInterface);
            }

            let guid = (*interface_list).InterfaceInfo[0].InterfaceGuid;
            WlanFreeMemory(interface_list as *mut _);
            Ok(guid)
        }
    }
}

impl Drop for WlanHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = WlanCloseHandle(self.handle, None);
        }
    }
}

impl WifiProvider for PlatformProvider {
    fn request_scan_permission(&self, rationale: &PermissionRationale) -> PermissionStatus {
        // A desktop session already carries the location grant that gates
        // Wi-Fi scanning; there is no dialog to raise here.
        info!(title = rationale.title, "scan permission implicitly granted");
        PermissionStatus::Granted
    }

    fn scan(&self) -> WifiResult<Vec<NetworkRecord>> {
        let handle = WlanHandle::open()?;
        let guid = handle.interface_guid()?;

        unsafe {
            let result = WlanScan(handle.as_raw(), &guid, None, None, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::ScanFailed {
                    reason: format!("WlanScan returned {result}"),
                });
            }
        }
        // The scan request only kicks the radio; results trickle into the
        // BSS cache over the next couple of seconds.
        std::thread::sleep(Duration::from_millis(SCAN_SETTLE_MS));

        collect_bss_records(&handle, &guid)
    }

    fn connect(&self, request: &ConnectRequest) -> WifiResult<()> {
        let handle = WlanHandle::open()?;
        let guid = handle.interface_guid()?;

        let profile_xml = build_profile_xml(request);
        set_profile(&handle, &guid, &request.ssid, &profile_xml)?;

        // Give the system a moment to register the profile
        std::thread::sleep(Duration::from_millis(PROFILE_REGISTRATION_DELAY_MS));

        unsafe {
            let ssid_wide: Vec<u16> = request.ssid.encode_utf16().chain(std::iter::once(0)).collect();
            let connection_params = WLAN_CONNECTION_PARAMETERS {
                wlanConnectionMode: wlan_connection_mode_profile,
                strProfile: PCWSTR(ssid_wide.as_ptr()),
                pDot11Ssid: std::ptr::null_mut(),
                pDesiredBssidList: std::ptr::null_mut(),
                dot11BssType: dot11_BSS_type_infrastructure,
                dwFlags: 0,
            };

            let result = WlanConnect(handle.as_raw(), &guid, &connection_params, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::ConnectFailed {
                    ssid: request.ssid.clone(),
                    reason: wlan_reason_to_string(result),
                });
            }
        }
        Ok(())
    }

    fn current_ssid(&self) -> WifiResult<Option<String>> {
        let handle = WlanHandle::open()?;
        let guid = handle.interface_guid()?;

        let mut connected_ssid = None;

        unsafe {
            let mut data_size = 0;
            let mut data_ptr: *mut std::ffi::c_void = std::ptr::null_mut();
            let mut opcode_value_type = wlan_opcode_value_type_invalid;

            let result = WlanQueryInterface(
                handle.as_raw(),
                &guid,
                wlan_intf_opcode_current_connection,
                None,
                &mut data_size,
                &mut data_ptr,
                Some(&mut opcode_value_type),
            );

            // ERROR_INVALID_STATE means "not associated", which is an
            // answer, not a failure.
            const ERROR_INVALID_STATE: u32 = 5023;
            if result == ERROR_INVALID_STATE {
                return Ok(None);
            }
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::QueryFailed {
                    reason: format!("WlanQueryInterface returned {result}"),
                });
            }

            let attributes = &*(data_ptr as *const WLAN_CONNECTION_ATTRIBUTES);
            if attributes.isState == wlan_interface_state_connected {
                let ssid = &attributes.wlanAssociationAttributes.dot11Ssid;
                let ssid_bytes = &ssid.ucSSID[..ssid.uSSIDLength as usize];
                connected_ssid = Some(String::from_utf8_lossy(ssid_bytes).to_string());
            }
            WlanFreeMemory(data_ptr);
        }

        Ok(connected_ssid)
    }

    fn disconnect(&self) -> WifiResult<()> {
        let handle = WlanHandle::open()?;
        let guid = handle.interface_guid()?;

        unsafe {
            let result = WlanDisconnect(handle.as_raw(), &guid, None);
            if result != ERROR_SUCCESS.0 {
                return Err(WifiError::DisconnectFailed {
                    reason: format!("WlanDisconnect returned {result}"),
                });
            }
        }
        Ok(())
    }
}

/// Read the BSS cache and flatten it into one record per broadcast.
#[allow(non_upper_case_globals)]
fn collect_bss_records(handle: &WlanHandle, guid: &GUID) -> WifiResult<Vec<NetworkRecord>> {
    let capabilities_by_ssid = capabilities_map(handle, guid)?;
    let mut records = Vec::new();

    unsafe {
        let mut bss_list: *mut WLAN_BSS_LIST = std::ptr::null_mut();
        let result = WlanGetNetworkBssList(
            handle.as_raw(),
            guid,
            None,
            dot11_BSS_type_any,
            false,
            None,
            &mut bss_list,
        );
        if result != ERROR_SUCCESS.0 {
            return Err(WifiError::ScanFailed {
                reason: format!("WlanGetNetworkBssList returned {result}"),
            });
        }

        let entries = std::slice::from_raw_parts(
            (*bss_list).wlanBssEntries.as_ptr(),
            (*bss_list).dwNumberOfItems as usize,
        );

        for entry in entries {
            let ssid_len = entry.dot11Ssid.uSSIDLength as usize;
            if ssid_len == 0 {
                continue;
            }
            let ssid = String::from_utf8_lossy(&entry.dot11Ssid.ucSSID[..ssid_len]).to_string();

            let capabilities = capabilities_by_ssid
                .get(&ssid)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());

            records.push(NetworkRecord {
                bssid: format_bssid(&entry.dot11Bssid),
                capabilities,
                frequency: entry.ulChCenterFrequency / 1000, // kHz -> MHz
                level: entry.lRssi,
                timestamp: entry.ullHostTimestamp,
                ssid,
            });
        }

        WlanFreeMemory(bss_list as *mut _);
    }

    Ok(records)
}

/// Security description per SSID, from the available-network list.
#[allow(non_upper_case_globals)]
fn capabilities_map(handle: &WlanHandle, guid: &GUID) -> WifiResult<HashMap<String, String>> {
    let mut map = HashMap::new();

    unsafe {
        let mut network_list: *mut WLAN_AVAILABLE_NETWORK_LIST = std::ptr::null_mut();
        let result = WlanGetAvailableNetworkList(
            handle.as_raw(),
            guid,
            WLAN_AVAILABLE_NETWORK_INCLUDE_ALL_ADHOC_PROFILES
                | WLAN_AVAILABLE_NETWORK_INCLUDE_ALL_MANUAL_HIDDEN_PROFILES,
            None,
            &mut network_list,
        );
        if result != ERROR_SUCCESS.0 {
            return Err(WifiError::ScanFailed {
                reason: format!("WlanGetAvailableNetworkList returned {result}"),
            });
        }

        let items = std::slice::from_raw_parts(
            (*network_list).Network.as_ptr(),
            (*network_list).dwNumberOfItems as usize,
        );

        for item in items {
            let ssid_len = item.dot11Ssid.uSSIDLength as usize;
            if ssid_len == 0 {
                continue;
            }
            let ssid = String::from_utf8_lossy(&item.dot11Ssid.ucSSID[..ssid_len]).to_string();

            let auth = match item.dot11DefaultAuthAlgorithm {
                DOT11_AUTH_ALGO_80211_OPEN => "Open",
                DOT11_AUTH_ALGO_80211_SHARED_KEY => "Shared",
                DOT11_AUTH_ALGO_WPA => "WPA",
                DOT11_AUTH_ALGO_WPA_PSK => "WPA-PSK",
                DOT11_AUTH_ALGO_RSNA => "WPA2",
                DOT11_AUTH_ALGO_RSNA_PSK => "WPA2-PSK",
                DOT11_AUTH_ALGO_WPA3 => "WPA3",
                DOT11_AUTH_ALGO_WPA3_SAE => "WPA3-SAE",
                _ => "Unknown",
            };

            let cipher = match item.dot11DefaultCipherAlgorithm {
                DOT11_CIPHER_ALGO_NONE => "None",
                DOT11_CIPHER_ALGO_WEP40 | DOT11_CIPHER_ALGO_WEP104 => "WEP",
                DOT11_CIPHER_ALGO_TKIP => "TKIP",
                DOT11_CIPHER_ALGO_CCMP => "AES",
                DOT11_CIPHER_ALGO_GCMP => "GCMP",
                _ => "Unknown",
            };

            let capabilities = if auth == "Open" {
                "Open".to_string()
            } else {
                format!("{auth}/{cipher}")
            };
            map.entry(ssid).or_insert(capabilities);
        }

        WlanFreeMemory(network_list as *mut _);
    }

    Ok(map)
}

fn format_bssid(bssid: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        bssid[0], bssid[1], bssid[2], bssid[3], bssid[4], bssid[5]
    )
}

fn set_profile(handle: &WlanHandle, guid: &GUID, ssid: &str, xml: &str) -> WifiResult<()> {
    unsafe {
        let xml_wide: Vec<u16> = xml.encode_utf16().chain(std::iter::once(0)).collect();

        let mut reason_code = 0;
        let result = WlanSetProfile(
            handle.as_raw(),
            guid,
            0,
            PCWSTR(xml_wide.as_ptr()),
            None,
            true,
            None,
            &mut reason_code,
        );
        if result != ERROR_SUCCESS.0 {
            return Err(WifiError::ConnectFailed {
                ssid: ssid.to_string(),
                reason: format!("profile rejected (code: {result}, reason: {reason_code})"),
            });
        }
    }
    Ok(())
}

/// Build the WLAN profile document for a connect request.
///
/// Empty password means an open network. The legacy-auth toggle downgrades
/// the profile to WPA-PSK/TKIP for access points that predate WPA2.
fn build_profile_xml(request: &ConnectRequest) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)));

    let mut root = BytesStart::new("WLANProfile");
    root.push_attribute((
        "xmlns",
        "http://www.microsoft.com/networking/WLAN/profile/v1",
    ));
    let _ = writer.write_event(Event::Start(root));

    write_element(&mut writer, "name", &request.ssid);

    let _ = writer.write_event(Event::Start(BytesStart::new("SSIDConfig")));
    let _ = writer.write_event(Event::Start(BytesStart::new("SSID")));
    write_element(&mut writer, "name", &request.ssid);
    let _ = writer.write_event(Event::End(BytesEnd::new("SSID")));
    if request.hidden {
        write_element(&mut writer, "nonBroadcast", "true");
    }
    let _ = writer.write_event(Event::End(BytesEnd::new("SSIDConfig")));

    write_element(&mut writer, "connectionType", "ESS");
    write_element(&mut writer, "connectionMode", "manual");

    let _ = writer.write_event(Event::Start(BytesStart::new("MSM")));
    let _ = writer.write_event(Event::Start(BytesStart::new("security")));
    let _ = writer.write_event(Event::Start(BytesStart::new("authEncryption")));

    let open = request.password.expose_secret().is_empty();
    let (auth, cipher) = if open {
        ("open", "none")
    } else if request.legacy_auth {
        ("WPAPSK", "TKIP")
    } else {
        ("WPA2PSK", "AES")
    };
    write_element(&mut writer, "authentication", auth);
    write_element(&mut writer, "encryption", cipher);
    write_element(&mut writer, "useOneX", "false");
    let _ = writer.write_event(Event::End(BytesEnd::new("authEncryption")));

    if !open {
        let _ = writer.write_event(Event::Start(BytesStart::new("sharedKey")));
        write_element(&mut writer, "keyType", "passPhrase");
        write_element(&mut writer, "protected", "false");
        write_element(&mut writer, "keyMaterial", request.password.expose_secret());
        let _ = writer.write_event(Event::End(BytesEnd::new("sharedKey")));
    }

    let _ = writer.write_event(Event::End(BytesEnd::new("security")));
    let _ = writer.write_event(Event::End(BytesEnd::new("MSM")));
    let _ = writer.write_event(Event::End(BytesEnd::new("WLANProfile")));

    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, value: &str) {
    let _ = writer.write_event(Event::Start(BytesStart::new(name)));
    let _ = writer.write_event(Event::Text(BytesText::new(value)));
    let _ = writer.write_event(Event::End(BytesEnd::new(name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn request(password: &str, legacy_auth: bool) -> ConnectRequest {
        ConnectRequest {
            ssid: "CafeNet".to_string(),
            password: SecretString::from(password),
            hidden: false,
            legacy_auth,
        }
    }

    #[test]
    fn protected_profile_uses_wpa2_psk() {
        let xml = build_profile_xml(&request("hunter2", false));
        assert!(xml.contains("<authentication>WPA2PSK</authentication>"));
        assert!(xml.contains("<keyMaterial>hunter2</keyMaterial>"));
        assert!(!xml.contains("nonBroadcast"));
    }

    #[test]
    fn empty_password_yields_an_open_profile_without_a_key() {
        let xml = build_profile_xml(&request("", false));
        assert!(xml.contains("<authentication>open</authentication>"));
        assert!(!xml.contains("sharedKey"));
    }

    #[test]
    fn legacy_auth_downgrades_to_wpa_psk_tkip() {
        let xml = build_profile_xml(&request("hunter2", true));
        assert!(xml.contains("<authentication>WPAPSK</authentication>"));
        assert!(xml.contains("<encryption>TKIP</encryption>"));
    }

    #[test]
    fn ssid_markup_is_escaped() {
        let mut req = request("hunter2", false);
        req.ssid = "Cafe<&>Net".to_string();
        let xml = build_profile_xml(&req);
        assert!(xml.contains("Cafe&lt;&amp;&gt;Net"));
    }
}

/// Render a WLAN error/reason code for the connect-failure notice
fn wlan_reason_to_string(code: u32) -> String {
    match code {
        0x00028002 => "Association Failed".to_string(),
        0x00028003 => "Association Timeout".to_string(),
        0x00028006 => "Security Failure".to_string(),
        0x00028007 => "Security Timeout".to_string(),
        0x0002800B => "Driver Disconnected (Possible Wrong Password)".to_string(),
        0x00038002 => "Connection Failed (Network Not Available or Wrong Password)".to_string(),
        0x00038003 => "Profile Not Found".to_string(),
        0x00048005 => "Incorrect Password (Key Exchange Timeout)".to_string(),
        0x00048014 => "Authentication Timeout (Possible Wrong Password)".to_string(),
        0x00050004 => "Incorrect Password".to_string(),
        _ => format!("Unknown Error (Code: {code}, 0x{code:X})"),
    }
}

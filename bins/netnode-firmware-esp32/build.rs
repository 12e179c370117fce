//! Build script for the netnode ESP32 firmware.

fn main() {
    // Exposes the ESP-IDF environment to esp-idf-sys.
    embuild::espidf::sysenv::output();

    for var in [
        "NETNODE_MODE",
        "WIFI_SSID",
        "WIFI_PASS",
        "AP_CHANNEL",
        "AP_MAX_CONN",
        "AP_WPA3",
        "NETNODE_URL",
        "NETNODE_FIXED_DELAY_MS",
    ] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}

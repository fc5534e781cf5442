fn main() {
    println!("cargo:rerun-if-env-changed=DEWVENT_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=DEWVENT_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=DEWVENT_MQTT_URL");
    println!("cargo:rerun-if-env-changed=DEWVENT_MQTT_USER");
    println!("cargo:rerun-if-env-changed=DEWVENT_MQTT_PASSWORD");
    println!("cargo:rerun-if-env-changed=DEWVENT_MQTT_CLIENT_ID");
    println!("cargo:rerun-if-env-changed=DEWVENT_MQTT_BASE_TOPIC");

    // Host-side test builds run without the ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

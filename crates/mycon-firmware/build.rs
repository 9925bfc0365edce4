//! Loads Wi-Fi credentials and the listening port from `.env` at build time
//! and exposes them to `option_env!` in `wifi_secrets`.

const FORWARDED_VARS: [&str; 3] = ["MYCON_WIFI_SSID", "MYCON_WIFI_PASSWORD", "MYCON_PORT"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for var in FORWARDED_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();

    for var in FORWARDED_VARS {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={var}={value}");
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

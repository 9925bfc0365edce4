#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use static_cell::StaticCell;

use mycon_core::app_state::{AppError, AppRunState};
use mycon_core::{KeyReceiver, KeySnapshot};
use mycon_firmware::{receiver, wifi, wifi_secrets};

/// Interval at which the main loop samples key state.
const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Seed for the network stack's local port and sequence randomization.
const NET_SEED: u64 = 0x6d79_636f_6e5f_7273;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static RECEIVER: StaticCell<KeyReceiver> = StaticCell::new();

fn enter(run_state: &mut AppRunState, next: AppRunState) {
    info!("Run state: {} -> {}", run_state.label(), next.label());
    *run_state = next;
}

/// Log the error and park; nothing useful can run without the network.
async fn halt(run_state: &mut AppRunState, err: AppError) -> ! {
    enter(run_state, AppRunState::Error);
    error!("{}", err);
    loop {
        Timer::after_secs(1).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let mut run_state = AppRunState::Uninitialized;

    let Some(app_config) = wifi_secrets::config() else {
        halt(
            &mut run_state,
            AppError::wifi("MYCON_WIFI_SSID was not set at build time"),
        )
        .await
    };

    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => {
            error!("esp-radio init failed: {:?}", e);
            halt(&mut run_state, AppError::wifi("radio init failed")).await
        }
    };

    let (mut controller, interfaces) =
        match esp_radio::wifi::new(radio, peripherals.WIFI, Default::default()) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Wi-Fi peripheral init failed: {:?}", e);
                halt(&mut run_state, AppError::wifi("controller init failed")).await
            }
        };

    if let Err(e) = wifi::configure_station(&mut controller, &app_config.wifi) {
        error!("Wi-Fi station config failed: {:?}", e);
        halt(&mut run_state, AppError::wifi("station config rejected")).await
    }

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        NET_SEED,
    );

    spawner.spawn(wifi::net_task(runner).expect("net task spawned twice"));

    enter(&mut run_state, AppRunState::WifiConnecting);
    info!("Connecting to SSID '{}'", app_config.wifi.ssid);
    spawner.spawn(wifi::connection_task(controller, stack).expect("wifi task spawned twice"));

    stack.wait_config_up().await;
    if let Some(v4) = stack.config_v4() {
        info!("Got IP: {}", v4.address);
    }
    enter(&mut run_state, AppRunState::WifiConnected);

    let key_receiver: &'static KeyReceiver = RECEIVER.init(KeyReceiver::new(app_config.receiver));
    if let Err(e) = receiver::start(&spawner, stack, key_receiver, app_config.listen_port) {
        halt(&mut run_state, e.into()).await
    }
    enter(&mut run_state, AppRunState::Receiving);

    let mut previous = KeySnapshot::released();
    let mut link_alive = false;
    loop {
        let current = key_receiver.snapshot();
        for (key, down) in current.changes_since(&previous) {
            info!("{} {}", key.name(), if down { "pressed" } else { "released" });
        }
        previous = current;

        let alive = key_receiver.is_link_alive();
        if alive != link_alive {
            info!("Controller {}", if alive { "online" } else { "offline" });
            link_alive = alive;
        }

        Timer::after(FRAME_DURATION).await;
    }
}

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Instant, Timer};
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
use log::{error, info};

use sunrise_lamp::app::{ProvisioningUsecases, SunriseContext};
use sunrise_lamp::config::{BUILD_VERSION, PROVISIONING, SUNRISE, TIME};
use sunrise_lamp::controllers::OtaController;
use sunrise_lamp::infrastructure::drivers::{EspLedDriver, init_flash_storage_mutex, init_wifi};
use sunrise_lamp::infrastructure::services::{FlashConfigurationStore, OtaService, SntpTimeSource};
use sunrise_lamp::infrastructure::tasks::ota_listener_task;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    esp_println::println!("sunrise lamp");
    esp_println::println!("build: {}", BUILD_VERSION);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Wi-Fi configuration strings live on the heap
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let flash = init_flash_storage_mutex(peripherals.FLASH);
    let ota_service = OtaService::new(flash);
    ota_service.handle_boot_state();

    let store = FlashConfigurationStore::new(flash);
    let wifi = init_wifi(spawner, peripherals.WIFI);
    let mut provisioning = ProvisioningUsecases::new(
        store,
        wifi,
        PROVISIONING.join_timeout,
        PROVISIONING.portal_timeout,
    );
    let outcome = match provisioning.run().await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("provisioning failed: {:?}, restarting", err);
            Timer::after(PROVISIONING.restart_delay).await;
            esp_hal::system::software_reset();
        }
    };

    let wifi = provisioning.into_wifi();
    let stack = wifi.station_stack();
    wifi.spawn_keepalive();
    spawner
        .spawn(ota_listener_task(stack, OtaController::new(ota_service)))
        .ok();

    info!("Ready");
    if let Some(config) = stack.config_v4() {
        info!("IP address: {}", config.address.address());
    }
    info!("location: {}", outcome.settings.location);

    let led_driver = EspLedDriver::new(peripherals.RMT, sunrise_lamp::led_gpio!(peripherals));
    let time_source = SntpTimeSource::new(stack, TIME.ntp_host, TIME.response_timeout);
    let mut sunrise = SunriseContext::new(
        led_driver,
        time_source,
        SUNRISE.length,
        TIME.refresh_interval,
        TIME.utc_offset_secs,
        Instant::now(),
    );
    if outcome.changed {
        sunrise.force_time_refresh();
    }
    sunrise.run(SUNRISE.frame_interval).await
}

use chrono::Utc;

fn main() {
    // Version string shown in the boot banner: date and time of the build.
    let version = Utc::now().format("%Y%m%d.%H%M").to_string();
    println!("cargo:rustc-env=BUILD_VERSION={version}");
    println!("cargo:rerun-if-env-changed=OTA_PASSWORD");
    println!("cargo:rerun-if-changed=partitions.csv");

    // make sure linkall.x is the last linker script
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

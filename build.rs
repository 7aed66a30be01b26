use std::env;
use std::process::Command;

// CPU features the capability probe and the index-lane primitives care about.
// Exactly one cfg flag wins per build; `fallback` means a 64-bit budget.
struct CpuFeature {
    name: &'static str,
    rustc_flag: &'static str,
    cfg_flag: &'static str,
    detected: bool,
}

// Priority order: widest usable register file first. avx512 only widens the
// capability budget; its code paths still use the avx2 intrinsics, so the
// rustc flags stay on stable features.
fn features() -> Vec<CpuFeature> {
    vec![
        CpuFeature {
            name: "avx512f",
            rustc_flag: "+avx2,+avx",
            cfg_flag: "avx512",
            detected: false,
        },
        CpuFeature {
            name: "avx2",
            rustc_flag: "+avx2,+avx",
            cfg_flag: "avx2",
            detected: false,
        },
        CpuFeature {
            name: "sse4_1",
            rustc_flag: "+sse4.1",
            cfg_flag: "sse",
            detected: false,
        },
        CpuFeature {
            name: "neon",
            rustc_flag: "+neon",
            cfg_flag: "neon",
            detected: false,
        },
    ]
}

// Feature detection trait to keep per-OS probing modular.
trait CpuFeatureDetector {
    fn detect_features(&self, features: &mut [CpuFeature]);
    fn is_applicable(&self) -> bool;
}

struct LinuxDetector;
impl CpuFeatureDetector for LinuxDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let contents = cpuinfo.to_lowercase();
            for feature in features.iter_mut() {
                feature.detected = contents.contains(feature.name);
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

struct MacOSDetector;
impl CpuFeatureDetector for MacOSDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        let output = Command::new("sysctl").args(["-a"]).output();

        if let Ok(output) = output {
            let contents = String::from_utf8_lossy(&output.stdout).to_lowercase();

            for feature in features.iter_mut() {
                let key = match feature.name {
                    "avx512f" => "hw.optional.avx512f: 1",
                    "avx2" => "hw.optional.avx2_0: 1",
                    "sse4_1" => "hw.optional.sse4_1: 1",
                    "neon" => "hw.optional.neon: 1",
                    _ => continue,
                };
                feature.detected = contents.contains(key);
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "macos")
    }
}

fn detect(features: &mut [CpuFeature]) {
    let detectors: Vec<Box<dyn CpuFeatureDetector>> =
        vec![Box::new(LinuxDetector), Box::new(MacOSDetector)];

    for detector in detectors {
        if detector.is_applicable() {
            detector.detect_features(features);
            break;
        }
    }
}

fn apply(features: &[CpuFeature]) {
    // Highest-priority detected feature wins; anything else falls back to
    // the scalar path and the 64-bit capability budget.
    let cfg_flag = features
        .iter()
        .find(|feature| feature.detected)
        .map(|feature| {
            println!("cargo:rustc-flag=-C");
            println!("cargo:rustc-flag=target-feature={}", feature.rustc_flag);
            feature.cfg_flag
        })
        .unwrap_or("fallback");

    println!("cargo:rustc-cfg={cfg_flag}");

    println!("cargo::rustc-check-cfg=cfg(avx512)");
    println!("cargo::rustc-check-cfg=cfg(avx2)");
    println!("cargo::rustc-check-cfg=cfg(sse)");
    println!("cargo::rustc-check-cfg=cfg(neon)");
    println!("cargo::rustc-check-cfg=cfg(fallback)");
}

fn main() {
    let mut features = features();

    // Only probe the host CPU for native builds; cross builds get the
    // portable fallback.
    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();

    if host == target {
        detect(&mut features);
    }

    apply(&features);
}

use segnet::{Accelerator, NetworkConfig};
use std::{env, path::PathBuf};

const DEFAULT_NETWORK: &str = "fcn-resnet18-sun";
const DEFAULT_INPUT: &str = "rgb.png";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    base::init_from_env();

    // segnet-camera [--network=NAME|config.json] [image]
    let mut network = DEFAULT_NETWORK.to_string();
    let mut input = PathBuf::from(DEFAULT_INPUT);
    for arg in env::args().skip(1) {
        if arg.starts_with("--network=") {
            network = arg;
        } else {
            input = PathBuf::from(arg);
        }
    }

    let mut config = NetworkConfig::from_arg(&network)?;
    if let Ok(dir) = env::var("SEGNET_MODEL_DIR") {
        config = config.with_model_dir(dir);
    }

    let data = tokio::fs::read(&input).await?;
    let frame = frame::decode_frame(&data).await?;
    let (width, height) = (frame.width(), frame.height());
    println!("Input: {} ({}x{})", input.display(), width, height);
    println!("Network: {}", config.name);

    let accelerator = match env::var("SEGNET_CUDA_DEVICE") {
        Ok(ordinal) => Accelerator::cuda(ordinal.parse()?)?,
        Err(_) => Accelerator::cpu(),
    };
    let mut segmenter = accelerator.use_segmenter(width, height, &config)?;
    let (mask_width, mask_height) = segmenter.mask_size();

    let output = segmenter.process(&frame)?;
    let report = output.report.clone();
    let overlay = output.overlay.to_vec();
    let mask = output.mask.to_vec();

    if report.overlay_succeeded() {
        let png = frame::encode_png(overlay, width as u32, height as u32).await?;
        tokio::fs::write("overlay.png", png).await?;
        println!("Wrote overlay.png");
    }
    if report.mask_succeeded() {
        let png = frame::encode_png(mask, mask_width as u32, mask_height as u32).await?;
        tokio::fs::write("mask.png", png).await?;
        println!("Wrote mask.png ({}x{})", mask_width, mask_height);
    }

    if let Some(class_map) = segmenter.class_map() {
        let palette = segmenter.palette();
        let cells = class_map.classes().len().max(1) as f32;
        for (class, count) in class_map.histogram().into_iter().enumerate() {
            if count > 0 {
                println!(
                    "  {:>12}: {:5.1}%",
                    palette.label(class as u32).unwrap_or("unknown"),
                    100.0 * count as f32 / cells
                );
            }
        }
    }

    segmenter.shutdown()?;

    if !report.is_ok() {
        eprintln!("Failed stages: {:?}", report.failed_stages());
        std::process::exit(1);
    }
    Ok(())
}

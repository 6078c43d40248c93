use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use wojtek_core::ImageSlot;
use wojtek_interaction::GalleryImage;

use super::context::{AppContext, describe_source, write_data_uri};

fn print_image(image: &GalleryImage) {
    println!(
        "{} {}",
        image.slot.title().bold(),
        format!("[{}]", image.label()).bright_magenta()
    );
    println!("  {}", describe_source(&image.source).bright_black());
}

pub async fn upload(slot: ImageSlot, file: &Path) -> Result<()> {
    let app = AppContext::load().await?;
    let pipeline = app.pipeline().await?;

    let compressed = pipeline
        .upload_file(slot, file)
        .await
        .with_context(|| format!("Failed to upload {} into {}", file.display(), slot))?;

    if let Some(status) = pipeline.status() {
        println!("{}", status.green());
    }
    println!(
        "{}",
        format!(
            "{}x{}, {} znaków",
            compressed.width,
            compressed.height,
            compressed.data_uri.as_str().len()
        )
        .bright_black()
    );
    Ok(())
}

pub async fn show(slot: ImageSlot, out: Option<&Path>) -> Result<()> {
    let app = AppContext::load().await?;
    let image = app.gallery().await?.current(slot);
    print_image(&image);

    if let Some(path) = out {
        let uri = image
            .data_uri()
            .with_context(|| format!("Slot {slot} holds no stored image"))?;
        write_data_uri(&uri, path)?;
        println!("{}", format!("Zapisano w {}", path.display()).green());
    }
    Ok(())
}

pub async fn gallery() -> Result<()> {
    let app = AppContext::load().await?;
    let gallery = app.gallery().await?;

    for slot in ImageSlot::ALL {
        if gallery.needs_generation(slot) {
            println!("{}", slot.generating_label().yellow());
        }
        let image = gallery.resolve(slot).await;
        print_image(&image);
    }
    Ok(())
}

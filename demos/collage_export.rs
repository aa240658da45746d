use textcollage::{
    CanvasSettings, Collage, CollageCodec, FontFamily, FontSpec, Rasterizer, Rgb,
    ScatterGenerator, TextItem, export_image,
};

#[allow(clippy::unwrap_used)]
fn main() {
    env_logger::init();

    let settings = CanvasSettings::default();
    let rasterizer = Rasterizer::with_system_fonts(&settings);
    if !rasterizer.has_fonts() {
        println!("No system fonts found; labels will be drawn without glyphs.");
    }

    let mut collage = Collage::new();
    collage.add(
        TextItem::builder("Text Collage", 400, 80)
            .text_color(Rgb::new(180, 0, 0))
            .font(FontSpec::new(FontFamily::SansSerif, 32.0).bold())
            .background(Rgb::WHITE)
            .border(true)
            .build(),
    );
    collage.add(
        TextItem::builder("rotated", 650, 400)
            .rotation_angle(30.0)
            .magnification(1.5)
            .text_transparency(0.25)
            .build(),
    );

    let mut scatter = ScatterGenerator::for_surface(settings.width, settings.height).with_seed(7);
    collage.extend(scatter.generate(30));

    std::fs::create_dir_all("debug").expect("failed to create debug directory");

    let codec = CollageCodec::from_settings(&settings);
    codec
        .save(&collage, "debug/collage.txt".as_ref())
        .expect("failed to save collage");
    let mut reloaded = Collage::new();
    codec
        .open("debug/collage.txt".as_ref(), &mut reloaded)
        .expect("failed to reload collage");
    println!("Saved and reloaded {} labels", reloaded.len());

    let timer = std::time::Instant::now();
    let surface = rasterizer.render(&collage, settings.width, settings.height);
    println!(
        "Rendered {}x{} canvas (elapsed: {:.2?})",
        surface.width,
        surface.height,
        timer.elapsed()
    );

    export_image(&surface, "debug/textimage.png".as_ref()).unwrap();
    println!("Saved image to debug/textimage.png");
}

use std::process;
use std::time::Instant;

use matchviz_cli::{render_descriptor_overlay, render_keypoint_overlay, render_match_overlay, VizResult};

const USAGE: &str = "\
Usage:
  matchviz keypoints   <image> <features.json> <out.png>
  matchviz descriptors <image> <features.json> <out.png>
  matchviz matches     <source> <target> <matches.json> <out.png>

Feature files are JSON. Keypoint/descriptor files hold
{\"reference\": [...], \"found\": [...]}; match files hold a bare array of
correspondences.";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("matchviz: {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> VizResult<()> {
    let (output, image) = match args {
        [cmd, image, features, out] if cmd == "keypoints" => {
            let t0 = Instant::now();
            let img = render_keypoint_overlay(image, features)?;
            println!("Rendered keypoint overlay in {:.2?}", t0.elapsed());
            (out, img)
        }
        [cmd, image, features, out] if cmd == "descriptors" => {
            let t0 = Instant::now();
            let img = render_descriptor_overlay(image, features)?;
            println!("Rendered descriptor overlay in {:.2?}", t0.elapsed());
            (out, img)
        }
        [cmd, source, target, matches, out] if cmd == "matches" => {
            let t0 = Instant::now();
            let img = render_match_overlay(source, target, matches)?;
            println!("Rendered match overlay in {:.2?}", t0.elapsed());
            (out, img)
        }
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    image.save(output)?;
    println!("Saved {}", output);
    Ok(())
}

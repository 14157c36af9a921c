use gazetrack::{GazeConfig, GazeSession, LandmarkSet};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args.len() % 2 == 0 {
        eprintln!(
            "Usage: {} <frame.png> <landmarks.json> [<frame.png> <landmarks.json> ...]",
            args[0]
        );
        std::process::exit(2);
    }

    let mut session = GazeSession::new(GazeConfig::default());
    for pair in args[1..].chunks(2) {
        let frame = image::open(&pair[0])?.to_luma8();
        let landmarks = LandmarkSet::from_json_file(Path::new(&pair[1]))?;
        let analysis = session.analyze(&frame, Some(&landmarks));
        println!(
            "{}: {} left={:?} right={:?} calibrated={}",
            pair[0],
            analysis.state(),
            analysis.pupil_left_coords(),
            analysis.pupil_right_coords(),
            session.calibration().is_complete()
        );
    }
    Ok(())
}

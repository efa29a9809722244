//! Coaching phrases: progressive hints, short cues, explanations and
//! rep-count encouragement.
//!
//! All text is static or formatted from enums and numbers.

use crate::types::{Fault, FeedbackType, RiskLevel};

/// Hints for a fault, mildest first. The last one repeats once exhausted.
fn hints(fault: Fault) -> &'static [&'static str] {
    match fault {
        Fault::ChestFalling => &[
            "Keep your chest proud and your eyes forward.",
            "Picture pushing your chest through a doorway in front of you.",
            "Squeeze your upper back to hold the torso upright.",
            "Lead with your chest as you stand up.",
        ],
        Fault::KneeValgus => &[
            "Push your knees out so they track over your toes.",
            "Think about spreading the floor apart with your feet.",
            "Fire your glutes to keep the knees stable and out.",
            "Imagine a band pulling your knees together and fight it.",
        ],
        Fault::NotDeepEnough => &[
            "Sit back a little more, as if into a chair.",
            "Lower until your hip crease drops below your knee.",
            "Control the descent; depth comes with practice.",
            "Keep your weight in your heels and sink deeper.",
        ],
        Fault::HipSag => &[
            "Pull your belly button toward your spine.",
            "Squeeze your glutes to lift your hips back into line.",
            "Make one straight line from head to heels.",
            "Breathe steadily and keep the core tight throughout.",
        ],
        Fault::UnstableKnees => &[
            "Slow the movement down to gain control.",
            "Engage your quads and focus on balance.",
            "Keep your core tight to steady the whole body.",
            "Try a slightly narrower stance or adjust your feet.",
        ],
        Fault::KneeOverToes => &[
            "Shift your weight back onto your heels.",
            "Keep the front shin vertical with the knee behind the toes.",
            "Sit back into the lunge rather than forward.",
            "Drop the back knee down instead of driving the front knee forward.",
        ],
        Fault::ElbowsFlaring => &[
            "Hold your elbows about 45 degrees from your body.",
            "Tuck your elbows toward your sides on the way down.",
            "Keep the elbows near your ribs to protect your shoulders.",
            "Think elbows back, not elbows out.",
        ],
        _ => &["Focus on your form and control."],
    }
}

/// Hint for the `count`-th occurrence (1-based).
pub fn progressive_hint(fault: Fault, count: u32) -> &'static str {
    let list = hints(fault);
    let index = (count.max(1) as usize - 1).min(list.len() - 1);
    list[index]
}

pub fn actionable_cue(fault: Fault) -> &'static str {
    match fault {
        Fault::ChestFalling => "Chest up, eyes forward",
        Fault::KneeValgus => "Knees out over toes",
        Fault::NotDeepEnough => "Sit back deeper",
        Fault::HipSag => "Brace core, squeeze glutes",
        Fault::UnstableKnees => "Slow down, control it",
        Fault::KneeOverToes => "Weight on heels, shift back",
        Fault::ElbowsFlaring => "Elbows at 45°, tuck in",
        Fault::LowerChestMore => "Chest closer to the floor",
        Fault::PoorBalance => "Core tight, find your centre",
        Fault::IncorrectDepth => "Aim for 90° at the knee",
        Fault::HipsTooHigh => "Lower hips into line",
        Fault::UnstableCore => "Brace abs, breathe steady",
        Fault::PoorVisibility => "Stay in frame",
    }
}

pub fn detailed_explanation(fault: Fault) -> &'static str {
    match fault {
        Fault::ChestFalling => {
            "An upright chest keeps the spine neutral so the load spreads safely across your back instead of straining the lower back."
        }
        Fault::KneeValgus => {
            "Knees caving inward stress the ACL and meniscus. Pushing them out protects the joint and lets your glutes do their job."
        }
        Fault::NotDeepEnough => {
            "A full range of motion recruits more muscle fibres and builds strength through the whole movement."
        }
        Fault::HipSag => {
            "Sagging hips load the lower back and switch off the core, which can lead to back pain and a weaker exercise."
        }
        Fault::UnstableKnees => {
            "Wobbling knees point to weak stabiliser muscles. Controlled reps build that strength and prevent injury."
        }
        Fault::KneeOverToes => {
            "A knee travelling past the toes raises shear force on the knee joint and patellar tendon. Keep the shin vertical."
        }
        Fault::ElbowsFlaring => {
            "Wide elbows stress the shoulder joint and rotator cuff. Around 45 degrees protects the shoulder while working chest and triceps."
        }
        Fault::LowerChestMore => {
            "Stopping short reduces the work done. Bringing the chest close to the floor builds more strength."
        }
        Fault::PoorBalance => {
            "Balance problems usually mean a weak core, and a strong core protects you in every compound movement."
        }
        Fault::IncorrectDepth => {
            "A 90 degree front knee gives full muscle activation. Too shallow loses the benefit and too deep strains the joint."
        }
        Fault::HipsTooHigh => {
            "Raised hips take work off the abdominals and shift it onto the shoulders."
        }
        Fault::UnstableCore => {
            "An unstable core wastes effort and puts the spine at risk. Stability is the base of every movement."
        }
        Fault::PoorVisibility => {
            "Tracking needs your whole body in view to judge your form accurately."
        }
    }
}

/// Headline and spoken text for an escalated fault.
pub fn escalation_message(fault: Fault, count: u32) -> (String, String) {
    let headline = format!("You've had {count} instances of {fault}");
    let voice = format!(
        "You've had {count} instances of {fault}. Let's fix this: {}. {} Why this matters: {} Take a moment to reset and focus on this correction.",
        actionable_cue(fault),
        progressive_hint(fault, count),
        detailed_explanation(fault),
    );
    (headline, voice)
}

/// Encouragement line for a rep number.
pub fn encouragement(rep_count: u32) -> String {
    const ROTATION: u32 = 8;
    match rep_count {
        0 => "Excellent form! That's how it's done!".to_string(),
        n if n >= 10 => "Your form is spot-on! This is elite-level execution!".to_string(),
        n if n >= 5 => format!("{n} clean reps and counting, incredible work!"),
        n => match n % ROTATION {
            1 => format!("{n} perfect reps, you're crushing it!"),
            2 => "Beautiful technique! Keep this consistency!".to_string(),
            3 => "That's textbook form! Outstanding!".to_string(),
            _ => format!("Rep {n}, keep it up!"),
        },
    }
}

/// Rep-count feedback tiered by the rep's quality score.
#[derive(Debug, Clone, PartialEq)]
pub struct RepAnnouncement {
    pub message: String,
    pub voice: String,
    pub kind: FeedbackType,
    pub risk: RiskLevel,
}

pub fn rep_announcement(rep_number: u32, quality: f64, fault: Option<Fault>) -> RepAnnouncement {
    let score = quality.round();
    let cheer = encouragement(rep_number);
    let voice = if quality >= 75.0 {
        format!("{cheer} Amazing rep! {score}% quality.")
    } else if quality >= 60.0 {
        match fault {
            Some(f) => format!("{cheer} Great rep! {score}%. Pro tip: watch the {}.", f.display_name().to_lowercase()),
            None => format!("{cheer} Great rep! {score}%. You're doing fantastic!"),
        }
    } else if quality >= 47.0 {
        match fault {
            Some(f) => format!("Nice! Rep {rep_number} counted at {score}%. Work on {f}, you're getting stronger!"),
            None => format!("Nice! Rep {rep_number} counted at {score}%. You're getting stronger!"),
        }
    } else {
        match fault {
            Some(f) => format!("Rep {rep_number} done! {score}%. {f} needs work, keep going!"),
            None => format!("Rep {rep_number} done! {score}%. Keep going, you're making progress!"),
        }
    };

    RepAnnouncement {
        message: format!("Rep {rep_number} ✓"),
        voice,
        kind: FeedbackType::Positive,
        risk: if quality >= 60.0 { RiskLevel::Low } else { RiskLevel::Medium },
    }
}

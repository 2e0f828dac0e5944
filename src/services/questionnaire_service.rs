//! Plain-text questionnaire rendering: one question per non-bonus song with
//! shuffled options and letter-coded answers.

use std::fmt::Write as _;

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::{
    dao::models::{
        AttributionEntity, AttributionRole, CustomOptionEntity, CustomOptionRole,
        ParticipantEntity, SongEntity,
    },
    error::ServiceError,
    state::SharedState,
};

struct Question {
    title: String,
    options: Vec<String>,
    /// Letters (A, B, ...) of the correct options.
    answers: Vec<char>,
}

/// Render the full questionnaire for every non-bonus song.
pub async fn render_questionnaire(state: &SharedState) -> Result<String, ServiceError> {
    let store = state.require_roster_store().await?;

    let songs = store.list_songs().await?;
    let participants = store.list_participants().await?;
    let attributions = store.list_attributions().await?;
    let custom_options = store.list_custom_options().await?;

    let mut rng = rand::rng();
    let questions = build_questions(
        &songs,
        &participants,
        &attributions,
        &custom_options,
        &mut rng,
    );
    Ok(render(&questions))
}

fn build_questions<R: Rng + ?Sized>(
    songs: &[SongEntity],
    participants: &[ParticipantEntity],
    attributions: &[AttributionEntity],
    custom_options: &[CustomOptionEntity],
    rng: &mut R,
) -> Vec<Question> {
    let mut quiz_songs: Vec<&SongEntity> = songs.iter().filter(|song| !song.is_bonus).collect();
    quiz_songs.sort_by(|a, b| {
        a.mystery_order
            .cmp(&b.mystery_order)
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut custom_by_song: IndexMap<Uuid, Vec<&CustomOptionEntity>> = IndexMap::new();
    for option in custom_options {
        custom_by_song.entry(option.song_id).or_default().push(option);
    }

    let mut questions = Vec::new();
    for song in quiz_songs {
        let question = match custom_by_song.get(&song.id) {
            Some(options) if !options.is_empty() => custom_question(song, options, rng),
            _ => participant_question(song, participants, attributions, rng),
        };
        if let Some(question) = question {
            questions.push(question);
        }
    }
    questions
}

/// Question backed by free-label custom options.
fn custom_question<R: Rng + ?Sized>(
    song: &SongEntity,
    options: &[&CustomOptionEntity],
    rng: &mut R,
) -> Option<Question> {
    let mut shuffled: Vec<&CustomOptionEntity> = options.to_vec();
    shuffled.shuffle(rng);

    let answers = answer_letters(&shuffled, |option| option.role == CustomOptionRole::Real);

    Some(Question {
        title: question_title(song),
        options: shuffled.iter().map(|option| option.label.clone()).collect(),
        answers,
    })
}

/// Question backed by attribution rows; disruptor participants are appended
/// after the shuffled candidates so their padding role stays recognizable to
/// organizers proofreading the sheet.
fn participant_question<R: Rng + ?Sized>(
    song: &SongEntity,
    participants: &[ParticipantEntity],
    attributions: &[AttributionEntity],
    rng: &mut R,
) -> Option<Question> {
    let rows: Vec<&AttributionEntity> = attributions
        .iter()
        .filter(|row| row.song_id == song.id)
        .collect();
    if rows.is_empty() {
        return None;
    }

    let find = |id: Uuid| participants.iter().find(|p| p.id == id);

    let mut entries: Vec<(&ParticipantEntity, bool)> = Vec::new();
    for row in &rows {
        if let Some(participant) = find(row.participant_id) {
            if !participant.disruptor_only {
                entries.push((participant, row.role == AttributionRole::Real));
            }
        }
    }
    entries.shuffle(rng);

    for disruptor in participants.iter().filter(|p| p.disruptor_only) {
        entries.push((disruptor, false));
    }

    let answers = answer_letters(&entries, |(_, is_real)| *is_real);

    Some(Question {
        title: question_title(song),
        options: entries
            .iter()
            .map(|(participant, _)| option_label(participant))
            .collect(),
        answers,
    })
}

fn question_title(song: &SongEntity) -> String {
    format!("{} - {}", song.title, song.artist)
}

fn option_label(participant: &ParticipantEntity) -> String {
    let label = match &participant.profile_url {
        Some(url) => format!("[{}]({url})", participant.name),
        None => participant.name.clone(),
    };
    if participant.disruptor_only {
        format!("(filler) {label}")
    } else {
        label
    }
}

fn answer_letters<T>(options: &[T], is_real: impl Fn(&T) -> bool) -> Vec<char> {
    options
        .iter()
        .enumerate()
        .filter(|(_, option)| is_real(option))
        .map(|(index, _)| (b'A' + index as u8) as char)
        .collect()
}

fn render(questions: &[Question]) -> String {
    let mut out = String::new();
    for (index, question) in questions.iter().enumerate() {
        let kind = if question.answers.len() > 1 {
            "multiple choice"
        } else {
            "single choice"
        };
        let _ = writeln!(out, "Q{}. {} [{kind}]", index + 1, question.title);
        for (option_index, option) in question.options.iter().enumerate() {
            let letter = (b'A' + option_index as u8) as char;
            let _ = writeln!(out, "{letter}. {option}");
        }
        let answers: Vec<String> = question.answers.iter().map(char::to_string).collect();
        let _ = writeln!(out, "Answer: {}", answers.join(", "));
        let _ = writeln!(out);
    }
    out
}

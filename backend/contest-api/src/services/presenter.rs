//! Student-facing view of an MCQ question set.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Question, QuestionView};

/// Orders questions (and, per question, options) for one delivery.
///
/// Works on a borrowed slice: the stored questions are never reordered. The
/// correct answer is matched by option text at grading time, so shuffling
/// options cannot invalidate it, and it is left out of the view.
pub fn present<R>(questions: &[Question], shuffle_questions: bool, rng: &mut R) -> Vec<QuestionView>
where
    R: Rng + ?Sized,
{
    let mut ordered: Vec<&Question> = questions.iter().collect();
    if shuffle_questions {
        ordered.shuffle(rng);
    }

    ordered
        .into_iter()
        .map(|question| {
            let mut options = question.options.clone();
            if question.randomize_order {
                options.shuffle(rng);
            }
            QuestionView {
                text: question.question.clone(),
                options,
                mark: question.mark,
                negative_mark: question.negative_mark,
            }
        })
        .collect()
}

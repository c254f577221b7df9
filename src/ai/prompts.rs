// src/ai/prompts.rs

use super::{StudentTestRequest, TeacherQuestionRequest};
use crate::models::question::{Question, QuestionType};

const TRUE_FALSE_RULE: &str = "For 'true/false' questions, the 'options' array must contain exactly two strings: 'Đúng' and 'Sai', and the correctAnswerIndex must be 0 for 'Đúng' and 1 for 'Sai'.";

pub fn teacher_questions(request: &TeacherQuestionRequest) -> String {
    format!(
        r#"
Based on the following context, generate a set of {count} educational questions.
Include a mix of question types: 'multiple-choice', 'true/false', and 'short-answer'.
The questions should be tailored for a cognitive level of "{level}" and a difficulty score of {difficulty}/10.
{true_false}
Format mathematical or scientific formulas using LaTeX.
For multiple-choice questions, shuffle the options.

Context:
---
{context}
---
"#,
        count = request.num_questions,
        level = request.cognitive_level,
        difficulty = request.difficulty,
        true_false = TRUE_FALSE_RULE,
        context = request.context,
    )
}

pub fn student_test(request: &StudentTestRequest) -> String {
    let types = request
        .question_types
        .iter()
        .map(QuestionType::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
Based on the following context, generate a {count}-question diagnostic test for a student.
The test is for the Subject "{subject}" at Grade Level "{grade}".
The questions must be at the Cognitive Level of "{level}".
The test should only include questions of the following types: {types}.
{true_false}

Context:
---
{context}
---
"#,
        count = request.num_questions,
        subject = request.subject,
        grade = request.grade,
        level = request.cognitive_level,
        types = types,
        true_false = TRUE_FALSE_RULE,
        context = request.context,
    )
}

/// The explanation is the answer key for objective questions only; free
/// response is graded on the answer alone.
pub fn grading(question: &Question, answer: &str) -> String {
    let explanation = if question.question_type == QuestionType::ShortAnswer {
        String::new()
    } else {
        format!("Correct Answer Explanation: \"{}\"", question.explanation)
    };

    format!(
        r#"
You are an expert teacher. Your task is to grade a student's answer.
Provide a score on a scale of 0 to 10.
Offer constructive feedback explaining what was right and what was wrong.
Give specific suggestions for improvement.

Question: "{question}"
{explanation}

Student's Answer: "{answer}"
"#,
        question = question.question_text,
        explanation = explanation,
        answer = answer,
    )
}

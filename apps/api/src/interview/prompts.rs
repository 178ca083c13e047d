// All LLM prompt constants for the interview operations.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for question generation.
pub const QUESTIONS_SYSTEM: &str = "You are an expert interview question generator for technical roles. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Question generation prompt template.
/// Replace: {number_of_questions}, {job_role}, {seniority_level}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate {number_of_questions} interview questions for a candidate applying for the role of {job_role} at the {seniority_level} level.

Return a JSON object with this EXACT schema (no extra fields):
{
  "questions": [
    "Question 1",
    "Question 2",
    "Question 3"
  ]
}

Rules:
- Return exactly {number_of_questions} questions
- Mix technical depth and behavioral questions appropriate for the seniority level
- Each question must be a single self-contained string"#;

/// System prompt for voice analysis.
pub const VOICE_SYSTEM: &str =
    "You are an AI voice analyst providing feedback on interview performance.";

/// Voice analysis prompt template. The audio itself is attached as inline media.
/// Replace: {json_only}, {actionable}
pub const VOICE_PROMPT_TEMPLATE: &str = r#"Analyze the attached audio recording of a candidate's interview answer for tone, clarity and pace.

{actionable}

Return a JSON object with this EXACT schema (no extra fields):
{
  "toneFeedback": "Feedback on the tone of the voice.",
  "clarityFeedback": "Feedback on the clarity of the voice.",
  "paceFeedback": "Feedback on the pace of the voice."
}

{json_only}"#;

/// System prompt for behavioral/sentiment analysis.
pub const RESPONSE_SYSTEM: &str = "You are an AI-powered interview coach.";

/// Behavioral analysis prompt template.
/// Replace: {question}, {response}, {json_only}, {actionable}
pub const RESPONSE_PROMPT_TEMPLATE: &str = r#"Analyze the candidate's response to the interview question for sentiment, behavioral cues, communication style, and approach.

Question: {question}
Response: {response}

{actionable}

Return a JSON object with this EXACT schema (no extra fields):
{
  "sentiment": "The overall sentiment of the response (e.g., positive, negative, neutral).",
  "behavioralCues": "Identified behavioral cues in the response (e.g., confidence, hesitation).",
  "communicationStyleFeedback": "Feedback on the candidate's communication style (e.g., clarity, conciseness).",
  "approachFeedback": "Feedback on the candidate's approach to answering the question (e.g., problem-solving, teamwork)."
}

{json_only}"#;

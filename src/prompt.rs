/// Persona given to the text model as the system message.
pub const SYSTEM_PROMPT: &str = "Ты профессиональный копирайтер";

/// Request sent on every attempt. It asks for a short HTML-formatted post and
/// a `[ФОТО: ...]` directive describing the illustration.
pub const POST_PROMPT: &str = "\
Сгенерируй популярный пост для Яндекс.Дзен длиной 800 символов с HTML-разметкой (b, i, a, h1).
Добавь описание изображения в формате [ФОТО: ...]. Пример:

<h1>Как мышь спасла город</h1>
<i>История, которую вы не слышали</i>
[ФОТО: старая карта, на которой изображена мышь, сидящая на бочке с порохом в подвале замка]
";

/// Yandex ART rejects prompts longer than this many characters.
pub const MAX_IMAGE_PROMPT_LEN: usize = 500;

/// Prepares a photo description for the image model: control characters are
/// replaced by spaces, whitespace runs collapsed and the result hard-truncated.
#[must_use]
pub fn sanitize_image_prompt(description: &str) -> String {
    let flattened: String = description
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    flattened
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_IMAGE_PROMPT_LEN)
        .collect()
}

use super::ImagePayload;

/// Output modalities requested from the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
        }
    }
}

/// One round trip to the image model: a prompt plus inline reference images.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub prompt: String,
    pub images: Vec<ImagePayload>,
    pub modalities: Vec<Modality>,
}

impl ContentRequest {
    pub fn new(prompt: impl Into<String>, images: Vec<ImagePayload>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            modalities: vec![Modality::Text, Modality::Image],
        }
    }
}

/// A single part of a model response, tagged by what it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPart {
    Image(ImagePayload),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub parts: Vec<ModelPart>,
}

impl ModelResponse {
    pub fn new(parts: Vec<ModelPart>) -> Self {
        Self { parts }
    }

    pub fn first_image(&self) -> Option<&ImagePayload> {
        self.parts.iter().find_map(|part| match part {
            ModelPart::Image(image) => Some(image),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ModelPart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_skips_text_and_empty_parts() {
        let response = ModelResponse::new(vec![
            ModelPart::Text("Here is the front view".into()),
            ModelPart::Empty,
            ModelPart::Image(ImagePayload::new("image/png", vec![1])),
            ModelPart::Image(ImagePayload::new("image/png", vec![2])),
        ]);
        assert_eq!(response.first_image().unwrap().bytes, vec![1]);
        assert_eq!(response.text(), "Here is the front view");
    }

    #[test]
    fn test_requests_text_and_image() {
        let request = ContentRequest::new("a barn", vec![]);
        assert_eq!(request.modalities, vec![Modality::Text, Modality::Image]);
    }
}

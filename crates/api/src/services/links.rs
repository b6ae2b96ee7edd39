//! Click-to-call, click-to-chat, email and map links built from settings.

use domain::models::{ContactSettings, LocationSettings};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Pre-filled click-to-chat greeting.
pub const WHATSAPP_GREETING: &str = "Hola Dr Smile, me interesa agendar una cita. ¡Saludos!";

/// Zoom level of the embedded map.
const EMBED_ZOOM: u8 = 17;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLinks {
    pub call: String,
    pub whatsapp: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLinks {
    pub view: String,
    pub directions: String,
    pub embed: String,
}

/// Links for the public site. A section is `None` while its settings are
/// missing or unpublished.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteLinks {
    pub contact: Option<ContactLinks>,
    pub map: Option<MapLinks>,
}

impl SiteLinks {
    pub fn build(contact: Option<&ContactSettings>, location: Option<&LocationSettings>) -> Self {
        Self {
            contact: contact.filter(|c| c.published).map(contact_links),
            map: location.filter(|l| l.published).map(map_links),
        }
    }
}

pub fn contact_links(contact: &ContactSettings) -> ContactLinks {
    ContactLinks {
        call: format!("tel:{}", contact.phone.replace(' ', "")),
        whatsapp: whatsapp_link(&contact.whatsapp, WHATSAPP_GREETING),
        email: format!("mailto:{}", contact.email.trim()),
    }
}

/// Characters left as-is in a URI component; spaces become `%20`, not `+`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `https://wa.me/{digits}?text={message}` with the message percent-encoded.
pub fn whatsapp_link(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        shared::validation::phone_digits(number),
        utf8_percent_encode(message, URI_COMPONENT)
    )
}

pub fn map_links(location: &LocationSettings) -> MapLinks {
    let (lat, lng) = (location.latitude, location.longitude);
    MapLinks {
        view: format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            lat, lng
        ),
        directions: format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            lat, lng
        ),
        embed: format!(
            "https://www.google.com/maps?q={},{}&output=embed&z={}",
            lat, lng, EMBED_ZOOM
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(published: bool) -> ContactSettings {
        ContactSettings {
            whatsapp: "+57 316 681 7878".to_string(),
            phone: "+57 316 681 7878".to_string(),
            email: "citas@drsmile.co".to_string(),
            published,
        }
    }

    fn location(published: bool) -> LocationSettings {
        LocationSettings {
            address: "Av. 4b Nte. #58N-60, Cali".to_string(),
            latitude: 3.4516,
            longitude: -76.532,
            published,
        }
    }

    #[test]
    fn test_contact_links() {
        let links = contact_links(&contact(true));
        assert_eq!(links.call, "tel:+573166817878");
        assert_eq!(links.email, "mailto:citas@drsmile.co");
        assert!(links.whatsapp.starts_with("https://wa.me/573166817878?text="));
        assert!(!links.whatsapp.contains(' '));
    }

    #[test]
    fn test_whatsapp_message_is_encoded() {
        let link = whatsapp_link("+1 (555) 010-9999", "Hola & adiós");
        assert_eq!(link, "https://wa.me/15550109999?text=Hola%20%26%20adi%C3%B3s");
    }

    #[test]
    fn test_whatsapp_spaces_are_not_plus() {
        let link = whatsapp_link("+57 316 681 7878", "Quiero una cita (mañana)!");
        assert_eq!(
            link,
            "https://wa.me/573166817878?text=Quiero%20una%20cita%20(ma%C3%B1ana)!"
        );
        assert!(!link.contains('+'));
    }

    #[test]
    fn test_map_links() {
        let links = map_links(&location(true));
        assert_eq!(
            links.view,
            "https://www.google.com/maps/search/?api=1&query=3.4516,-76.532"
        );
        assert_eq!(
            links.directions,
            "https://www.google.com/maps/dir/?api=1&destination=3.4516,-76.532"
        );
        assert_eq!(
            links.embed,
            "https://www.google.com/maps?q=3.4516,-76.532&output=embed&z=17"
        );
    }

    #[test]
    fn test_unpublished_sections_give_no_links() {
        let links = SiteLinks::build(Some(&contact(false)), Some(&location(false)));
        assert_eq!(links, SiteLinks::default());

        let links = SiteLinks::build(Some(&contact(true)), None);
        assert!(links.contact.is_some());
        assert!(links.map.is_none());
    }
}

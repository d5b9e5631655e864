/// Build the password-reset email. The raw token travels only inside the
/// redemption link; nothing else ever carries it.
pub fn password_reset_email(username: &str, reset_link: &str) -> (String, String) {
    let subject = "Password Reset Request - Wayfarer".to_string();

    let body = format!(
        "Hello {},\n\n\
        A password reset was requested for your Wayfarer account.\n\n\
        To choose a new password, open the link below:\n\n\
        {}\n\n\
        This link will expire in 1 hour and can be used only once.\n\n\
        If you did not request this reset, please ignore this email and ensure \
        your account is secure.\n\n\
        Best regards,\n\
        Wayfarer Travel Support",
        username, reset_link
    );

    (subject, body)
}

//! Shared email content templates
//!
//! Canonical content generators for invitation emails, shared by every
//! `EmailService` implementation.

/// Generate plain-text body for a team invitation email.
pub fn team_invitation_text(
    inviter_name: &str,
    team_name: &str,
    role: &str,
    invite_link: &str,
) -> String {
    format!(
        "Hi there!\n\n\
        {} has invited you to join the team '{}' as a {}.\n\n\
        Click the link below to accept the invitation:\n\
        {}\n\n\
        This invitation will expire in 7 days.\n\n\
        If you don't have a Postdeck account, you'll be prompted to create one.\n\n\
        Thanks,\n\
        The Postdeck Team",
        inviter_name, team_name, role, invite_link
    )
}

/// Generate styled HTML body for a team invitation email.
pub fn team_invitation_html(
    inviter_name: &str,
    team_name: &str,
    role: &str,
    invite_link: &str,
) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #5b4fc4;">You're invited to join {team_name}!</h2>

                    <p>Hi there!</p>

                    <p><strong>{inviter_name}</strong> has invited you to join the team '<strong>{team_name}</strong>' as a <strong>{role}</strong>.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{invite_link}"
                           style="background-color: #5b4fc4; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            Accept Invitation
                        </a>
                    </div>

                    <p>Or copy and paste this link in your browser:</p>
                    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
                        <a href="{invite_link}">{invite_link}</a>
                    </p>

                    <p style="color: #666; font-size: 14px;">
                        <em>This invitation will expire in 7 days.</em>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">

                    <p style="color: #666; font-size: 12px;">
                        If you don't have a Postdeck account, you'll be prompted to create one.<br>
                        Thanks, The Postdeck Team
                    </p>
                </div>
            </body>
            </html>
            "#,
        team_name = team_name,
        inviter_name = inviter_name,
        role = role,
        invite_link = invite_link
    )
}
